// src/common/ids.rs

/// Próximo identificador curto sequencial ("0001", "0002", ...).
///
/// Varre todos os ids existentes procurando o grupo de dígitos no final de
/// cada um, incrementa o maior encontrado e preenche com zeros até 4 dígitos.
/// Ids sem dígitos no final são ignorados.
pub fn next_short_id<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut maior: u64 = 0;
    for id in ids {
        if let Some(n) = trailing_digits(id) {
            maior = maior.max(n);
        }
    }
    format!("{:04}", maior + 1)
}

fn trailing_digits(id: &str) -> Option<u64> {
    let fim: Vec<char> = id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if fim.is_empty() {
        return None;
    }
    let digitos: String = fim.into_iter().rev().collect();
    digitos.parse().ok()
}

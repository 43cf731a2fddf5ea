/// Characters that carry meaning inside SQL pattern/regexp matching.
const SQL_PATTERN_CHARS: &str = "{}.[]|()*$?+\\";

/// Prefixes every pattern metacharacter with a backslash.
pub fn clean_sql_regexp(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if SQL_PATTERN_CHARS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes a search term for use in `LIKE ... ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in clean_sql_regexp(term).chars() {
        if c == '%' || c == '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// "mARIA   da silva" -> "Maria Da Silva"
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logins without `@` are documents; their punctuation is dropped.
pub fn sanitize_login(login: &str) -> String {
    let login = login.trim();
    if login.contains('@') {
        login.to_string()
    } else {
        login.chars().filter(|c| *c != '.' && *c != '-').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sql_regexp_escapes_every_metacharacter() {
        let input = r"{}.[]|()*$?+\";
        let escaped = clean_sql_regexp(input);
        assert_eq!(escaped, r"\{\}\.\[\]\|\(\)\*\$\?\+\\");

        // every escaped pair decodes back to the literal input
        let mut decoded = String::new();
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                decoded.push(chars.next().unwrap());
            } else {
                decoded.push(c);
            }
        }
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_clean_sql_regexp_keeps_plain_text() {
        assert_eq!(clean_sql_regexp("plain text 123"), "plain text 123");
        assert_eq!(clean_sql_regexp("a.b"), r"a\.b");
        assert_eq!(clean_sql_regexp(""), "");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("a.b"), r"a\.b");
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("mARIA   da silva"), "Maria Da Silva");
        assert_eq!(capitalize_words("  joão "), "João");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn test_sanitize_login() {
        assert_eq!(sanitize_login("529.982.247-25"), "52998224725");
        assert_eq!(sanitize_login(" first.last@mail.com "), "first.last@mail.com");
    }
}

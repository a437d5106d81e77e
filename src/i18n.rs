//! Localized UI strings.

/// Supported languages. Unknown locales fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

impl Locale {
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" | "pt" => Self::PtBr,
            _ => Self::En,
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("Search", "Search"),
    ("Search_Messages", "Search Messages"),
    (
        "You_can_search_using_RegExp_eg",
        "You can use RegExp. e.g. `/^text$/i`",
    ),
    ("Searching", "Searching"),
    ("Loading_more", "Loading more"),
    ("No_results_found", "No results found"),
    ("Edited", "edited"),
];

const PT_BR: &[(&str, &str)] = &[
    ("Search", "Buscar"),
    ("Search_Messages", "Buscar Mensagens"),
    (
        "You_can_search_using_RegExp_eg",
        "Você pode usar expressões regulares, por exemplo `/^texto$/i`",
    ),
    ("Searching", "Buscando"),
    ("Loading_more", "Carregando mais"),
    ("No_results_found", "Nenhum resultado encontrado"),
    ("Edited", "editado"),
];

fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => EN,
        Locale::PtBr => PT_BR,
    }
}

/// Look up `key`, falling back to English and then to the key itself.
pub fn t(locale: Locale, key: &str) -> &str {
    let find = |tbl: &'static [(&'static str, &'static str)]| {
        tbl.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    };
    let found: Option<&str> = find(table(locale)).or_else(|| find(EN));
    found.unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_tags() {
        assert_eq!(Locale::parse("pt_BR"), Locale::PtBr);
        assert_eq!(Locale::parse("pt-br"), Locale::PtBr);
        assert_eq!(Locale::parse("de"), Locale::En);
    }

    #[test]
    fn looks_up_translations() {
        assert_eq!(t(Locale::En, "Search"), "Search");
        assert_eq!(t(Locale::PtBr, "Search"), "Buscar");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(t(Locale::PtBr, "Not_A_Key"), "Not_A_Key");
    }
}

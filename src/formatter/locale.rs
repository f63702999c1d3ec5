//! Built-in locale table for number and date rendering

/// Rendering conventions for one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub tag: &'static str,
    pub decimal_separator: &'static str,
    /// strftime pattern for date-only cells
    pub date_pattern: &'static str,
    /// strftime pattern for cells carrying a time of day
    pub datetime_pattern: &'static str,
}

const LOCALES: &[Locale] = &[
    Locale {
        tag: "en",
        decimal_separator: ".",
        date_pattern: "%-m/%-d/%Y",
        datetime_pattern: "%-m/%-d/%Y %H:%M:%S",
    },
    Locale {
        tag: "ru",
        decimal_separator: ",",
        date_pattern: "%d.%m.%Y",
        datetime_pattern: "%d.%m.%Y %H:%M:%S",
    },
    Locale {
        tag: "uk",
        decimal_separator: ",",
        date_pattern: "%d.%m.%Y",
        datetime_pattern: "%d.%m.%Y %H:%M:%S",
    },
    Locale {
        tag: "de",
        decimal_separator: ",",
        date_pattern: "%d.%m.%Y",
        datetime_pattern: "%d.%m.%Y %H:%M:%S",
    },
    Locale {
        tag: "pl",
        decimal_separator: ",",
        date_pattern: "%d.%m.%Y",
        datetime_pattern: "%d.%m.%Y %H:%M:%S",
    },
    Locale {
        tag: "fr",
        decimal_separator: ",",
        date_pattern: "%d/%m/%Y",
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Locale {
        tag: "es",
        decimal_separator: ",",
        date_pattern: "%d/%m/%Y",
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Locale {
        tag: "it",
        decimal_separator: ",",
        date_pattern: "%d/%m/%Y",
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Locale {
        tag: "pt",
        decimal_separator: ",",
        date_pattern: "%d/%m/%Y",
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Locale {
        tag: "nl",
        decimal_separator: ",",
        date_pattern: "%d-%m-%Y",
        datetime_pattern: "%d-%m-%Y %H:%M:%S",
    },
];

impl Locale {
    /// Find a locale by tag. `ru_RU`, `ru-RU` and `RU` all match `ru`.
    pub fn lookup(tag: &str) -> Option<&'static Locale> {
        let language = tag
            .split(['_', '-', '.'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        LOCALES.iter().find(|locale| locale.tag == language)
    }

    /// Find a locale by tag, falling back to English for unknown tags
    pub fn resolve(tag: &str) -> &'static Locale {
        match Self::lookup(tag) {
            Some(locale) => locale,
            None => {
                tracing::debug!(locale = tag, "unsupported locale, falling back to en");
                &LOCALES[0]
            }
        }
    }

    /// Tags of all built-in locales
    pub fn supported_tags() -> Vec<&'static str> {
        LOCALES.iter().map(|locale| locale.tag).collect()
    }
}

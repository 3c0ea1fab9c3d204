//! Output language selection.
//!
//! `settings.language` is free text typed by the author ("English",
//! "简体中文", "Spanish (Mexico)", ...). It is matched by substring, falling
//! back to English.

/// Languages with localized labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    Chinese,
    Japanese,
    Spanish,
    #[default]
    English,
}

/// Fixed strings printed by the exporters.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub contents: &'static str,
    pub page: &'static str,
}

impl Locale {
    pub fn detect(language: &str) -> Self {
        let lower = language.to_lowercase();
        // Two-letter codes only count as whole tokens ("zh-CN", "es_MX").
        let tokens: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
        let has = |names: &[&str], code: &str| {
            names.iter().any(|n| lower.contains(n)) || tokens.contains(&code)
        };

        if has(&["chinese", "中文", "汉语", "漢語"], "zh") {
            Locale::Chinese
        } else if has(&["japanese", "日本語"], "ja") {
            Locale::Japanese
        } else if has(&["spanish", "español", "espanol"], "es") {
            Locale::Spanish
        } else {
            Locale::English
        }
    }

    /// BCP-47 tag for `dc:language`, `w:lang` and `/Lang`.
    pub fn code(self) -> &'static str {
        match self {
            Locale::Chinese => "zh",
            Locale::Japanese => "ja",
            Locale::Spanish => "es",
            Locale::English => "en",
        }
    }

    pub fn labels(self) -> Labels {
        match self {
            Locale::Chinese => Labels {
                contents: "目录",
                page: "第 {} 页",
            },
            Locale::Japanese => Labels {
                contents: "目次",
                page: "{} ページ",
            },
            Locale::Spanish => Labels {
                contents: "Índice",
                page: "Página {}",
            },
            Locale::English => Labels {
                contents: "Contents",
                page: "Page {}",
            },
        }
    }
}

impl Labels {
    /// Fill the page-number template.
    pub fn page_number(&self, number: usize) -> String {
        self.page.replace("{}", &number.to_string())
    }
}

//! Attribution records shown by the renderer.

/// An attribution: markup plus whether its links may be followed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credit {
    html: String,
    allow_link: bool,
}

impl Credit {
    pub fn new(html: impl Into<String>, allow_link: bool) -> Self {
        Self {
            html: html.into(),
            allow_link,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn allow_link(&self) -> bool {
        self.allow_link
    }
}

/// Translates source attribution markup into a credit with links enabled.
pub fn credit_from_attribution(html: impl Into<String>) -> Credit {
    Credit::new(html, true)
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// CSI escape sequences, such as the colour codes the device shell and its logger emit
static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid ANSI escape pattern"));

pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_codes_are_removed() {
        assert_eq!(
            strip_ansi("\x1b[1;32muart:~$ \x1b[mot state\r\n\x1b[0mleader"),
            "uart:~$ ot state\r\nleader"
        );
    }

    #[test]
    fn cursor_codes_are_removed() {
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Adone"), "done");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(strip_ansi("detached"), Cow::Borrowed("detached")));
    }
}

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Tokens shorter than this are dropped before counting.
pub const MIN_TOKEN_LEN: usize = 3;

/// Lowercases `text` and strips diacritics: Unicode case folding, NFD
/// decomposition, then removal of all combining marks, so "Canción"
/// becomes "cancion". Idempotent.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Normalizes a text fragment and yields its word tokens lazily.
///
/// A token is a maximal run of Unicode letters of at least
/// [`MIN_TOKEN_LEN`] letters. Everything else, including the
/// replacement character produced by lossy decoding, separates tokens.
pub fn tokenize(text: &str) -> Tokens {
    Tokens {
        text: normalize(text),
        pos: 0,
    }
}

/// Iterator over the tokens of a normalized fragment, in order of
/// appearance. Clone before iterating to keep a restartable copy.
#[derive(Debug, Clone)]
pub struct Tokens {
    text: String,
    pos: usize,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let Some(start) = rest.find(|c: char| c.is_alphabetic()) else {
                self.pos = self.text.len();
                return None;
            };
            let run = &rest[start..];
            let end = run
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(run.len());
            let token = &run[..end];
            self.pos += start + end;
            if token.chars().count() >= MIN_TOKEN_LEN {
                return Some(token.to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<String> {
        tokenize(text).collect()
    }

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(normalize("Canción"), "cancion");
        assert_eq!(normalize("ÁRBOL"), "arbol");
        assert_eq!(normalize("pingüino"), "pinguino");
        assert_eq!(normalize("no accents here"), "no accents here");
    }

    #[test]
    fn normalization_is_idempotent() {
        for text in [
            "El Sol es una estrella",
            "¿Qué pasó aquí?",
            "ÑANDÚ ñandú",
            "mixed ASCII and 数字 and ümlauts",
            "",
        ] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn splits_on_non_letters() {
        assert_eq!(
            collect("uno,dos;tres...cuatro"),
            vec!["uno", "dos", "tres", "cuatro"]
        );
        assert_eq!(collect("correo123electronico"), vec!["correo", "electronico"]);
    }

    #[test]
    fn drops_short_tokens() {
        assert_eq!(collect("El Sol es una estrella"), vec!["sol", "una", "estrella"]);
        assert_eq!(collect("y a de"), Vec::<String>::new());
    }

    #[test]
    fn accented_forms_collapse_to_one_token() {
        assert_eq!(collect("Árbol árbol ARBOL"), vec!["arbol", "arbol", "arbol"]);
    }

    #[test]
    fn replacement_char_acts_as_separator() {
        let lossy = String::from_utf8_lossy(b"sol\xffluna");
        assert_eq!(collect(&lossy), vec!["sol", "luna"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(collect(""), Vec::<String>::new());
        assert_eq!(collect("   \t\n"), Vec::<String>::new());
    }

    #[test]
    fn rescanning_yields_the_same_tokens() {
        let first: Vec<String> = tokenize("la estrella brilla").collect();
        let second: Vec<String> = tokenize("la estrella brilla").collect();
        assert_eq!(first, second);
    }
}

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Spanish function words and digit words, stored pre-normalized
/// (lowercase, diacritics stripped) so lookups match tokenizer output
/// without further processing.
const WORDS: &[&str] = &[
    "el", "la", "de", "que", "y", "a", "en", "un", "es", "se", "no", "te", "lo", "le", "da", "su",
    "por", "son", "con", "para", "al", "del", "las", "los", "una", "sobre", "todo", "pero", "mas",
    "me", "hasta", "muy", "ha", "donde", "quien", "entre", "sin", "puede", "tanto", "cada", "fue",
    "uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez", "asi",
    "tambien", "cuando", "como", "si", "ya", "este", "esta", "esto", "ese", "esa", "eso", "aqui",
    "ahi", "alli", "ser", "estar", "tener", "hacer", "decir", "poder", "ir", "ver", "dar", "saber",
    "querer", "llegar", "pasar", "deber", "poner", "venir", "salir", "volver", "seguir", "llevar",
    "quedar", "traer", "desde", "contra", "durante",
];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| WORDS.iter().copied().collect());

/// Set membership, not a regex scan: no partial-word false positives
/// and O(1) per candidate.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

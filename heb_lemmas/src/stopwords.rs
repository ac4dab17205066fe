//! Exact-match Hebrew stopword lookup.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Words dropped by [`StopwordFilter`](crate::analysis::StopwordFilter),
/// including the single-letter prefixes left over by upstream splitting.
pub const STOPWORDS: &[&str] = &[
    "אבל", "או", "אחר", "אך", "אל", "אם", "את", "בין", "גם", "דרך", "הוא", "היה", "זאת", "זה",
    "יותר", "יש", "כי", "כך", "כן", "לא", "לפני", "מה", "מי", "עד", "על", "עם", "רק", "של", "שם",
    "אדם", "אותה", "אותו", "אותם", "אחד", "אחרי", "אין", "אלא", "אלה", "אני", "אף", "אשר", "ב",
    "בגלל", "בית", "בן", "דבר", "היא", "הם", "זו", "זמן", "חלק", "יום", "יכול", "ישראל", "כדי",
    "כל", "כמו", "ל", "לה", "להיות", "לו", "לפי", "מן", "נגד", "עוד", "פה", "שלו", "שנה", "ש", "מ",
    "כ", "ו", "ה", "אז", "_", "אילו", "אלו",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

pub fn is_stopword(term: &str) -> bool {
    stopwords().contains(term)
}

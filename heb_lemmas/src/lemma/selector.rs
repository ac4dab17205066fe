use std::collections::HashSet;

use crate::vocab::CONTINUATION_PREFIX;
use crate::Vocab;

/// Aleph, he, vav and yod. They come and go between inflected forms and are
/// ignored when comparing a candidate with its surface form.
pub const WEAK_LETTERS: [char; 4] = ['א', 'ה', 'ו', 'י'];

/// Ids of the `k` highest scores, best first.
///
/// Equal scores rank by the lower id; NaN ranks below every number.
pub fn top_k(scores: &[f32], k: usize) -> Vec<u32> {
    let k = k.min(scores.len());
    let mut used = vec![false; scores.len()];
    let mut ranked = Vec::with_capacity(k);

    for _ in 0..k {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &score) in scores.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
            match best {
                Some((_, best_score)) if score <= best_score => (),
                _ => best = Some((idx, score)),
            }
        }

        if let Some((idx, _)) = best {
            used[idx] = true;
            ranked.push(idx as u32);
        }
    }

    ranked
}

fn significant_chars(word: &str) -> HashSet<char> {
    word.chars().filter(|c| !WEAK_LETTERS.contains(c)).collect()
}

/// Picks the first candidate sharing enough significant letters with
/// `original`, or returns `original` when none does.
///
/// Markers, continuation pieces and ids outside the vocabulary are skipped.
pub fn select_lemma(original: &str, candidates: &[u32], vocab: &Vocab) -> String {
    let original_chars = significant_chars(original);

    for &id in candidates {
        let candidate = match vocab.token_of(id) {
            Ok(candidate) => candidate,
            Err(_) => continue,
        };
        if candidate.starts_with('[') || candidate.starts_with(CONTINUATION_PREFIX) {
            continue;
        }

        let candidate_chars = significant_chars(candidate);
        let overlap = candidate_chars.intersection(&original_chars).count();
        let min_required = original_chars.len().min(candidate_chars.len()).min(2);
        if overlap >= min_required {
            return candidate.to_owned();
        }
    }

    original.to_owned()
}

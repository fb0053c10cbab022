//! Keyword-scored subject classification.

use std::collections::HashMap;

use crate::model::Subject;

/// Subjects in tie-break order, with their keywords.
///
/// Keywords are lowercase single words and match whole words only.
pub const SUBJECT_KEYWORDS: &[(Subject, &[&str])] = &[
    (
        Subject::Mathematics,
        &[
            "equation", "formula", "calculate", "theorem", "proof", "algebra", "geometry",
            "calculus", "derivative", "integral", "function", "variable", "solve", "graph",
            "matrix", "vector", "polynomial", "logarithm", "trigonometry", "statistics",
        ],
    ),
    (
        Subject::Biology,
        &[
            "cell", "organism", "dna", "gene", "evolution", "species", "ecosystem",
            "photosynthesis", "respiration", "protein", "bacteria", "virus", "tissue", "organ",
            "biological", "anatomy", "physiology", "genetics", "molecular",
        ],
    ),
    (
        Subject::Chemistry,
        &[
            "molecule", "atom", "reaction", "compound", "element", "bond", "solution", "acid",
            "base", "catalyst", "chemical", "periodic", "electron", "proton", "neutron",
            "oxidation", "reduction", "ionic", "covalent", "organic",
        ],
    ),
    (
        Subject::Physics,
        &[
            "force", "energy", "motion", "wave", "particle", "gravity", "electricity",
            "magnetism", "quantum", "relativity", "velocity", "acceleration", "momentum",
            "frequency", "amplitude", "thermodynamics", "optics", "nuclear", "electromagnetic",
        ],
    ),
    (
        Subject::History,
        &[
            "century", "war", "empire", "revolution", "civilization", "ancient", "medieval",
            "modern", "treaty", "dynasty", "historical", "period", "culture", "society",
            "political", "government", "democracy", "monarchy",
        ],
    ),
    (
        Subject::Literature,
        &[
            "author", "novel", "poem", "character", "plot", "theme", "metaphor", "symbolism",
            "narrative", "prose", "poetry", "literary", "writing", "story", "text", "analysis",
            "interpretation", "genre", "style",
        ],
    ),
    (
        Subject::Geography,
        &[
            "continent", "country", "climate", "mountain", "river", "ocean", "population",
            "region", "territory", "map", "location", "environment", "landscape", "geographic",
            "topography", "ecosystem", "natural", "resources",
        ],
    ),
];

/// Classify text by counting whole-word, case-insensitive keyword hits.
///
/// The highest-scoring subject wins; on a tie the one listed first in
/// [`SUBJECT_KEYWORDS`] wins. Text with no hits is [`Subject::General`].
pub fn classify(text: &str) -> Subject {
    let counts = word_counts(text);

    let mut best = Subject::General;
    let mut best_score = 0usize;
    for (subject, score) in subject_scores_from(&counts) {
        if score > best_score {
            best_score = score;
            best = subject;
        }
    }
    best
}

/// Per-subject scores, in table order.
pub fn subject_scores(text: &str) -> Vec<(Subject, usize)> {
    subject_scores_from(&word_counts(text))
}

fn subject_scores_from(counts: &HashMap<String, usize>) -> Vec<(Subject, usize)> {
    SUBJECT_KEYWORDS
        .iter()
        .map(|(subject, keywords)| {
            let score = keywords
                .iter()
                .map(|k| counts.get(*k).copied().unwrap_or(0))
                .sum::<usize>();
            (*subject, score)
        })
        .collect()
}

/// Count lowercase words, where a word is a maximal run of `[A-Za-z0-9_]`.
/// This is the same boundary a `\b` regex anchor uses.
fn word_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
    {
        *counts.entry(word.to_ascii_lowercase()).or_insert(0) += 1;
    }
    counts
}

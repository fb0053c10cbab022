//! Templated question synthesis from mined terms and sentences.
//!
//! Every question built here puts the correct answer at option 0. The
//! templates are fixed phrasings; only the term, subject and quoted sentence
//! vary.

use crate::is_usable_text;
use crate::model::{Question, Subject, OPTION_COUNT};

/// How many characters of a context sentence go into an explanation.
const QUOTE_CHARS: usize = 100;

/// Build exactly `requested` questions (or one, for unreadable text).
///
/// Policy, in order:
/// 1. Unusable text produces the single "document unreadable" question.
/// 2. One question per top-ranked term, quoting the first sentence that
///    mentions it when there is one.
/// 3. Up to two comprehension questions about the subject, if any
///    sentences were mined.
/// 4. Numbered filler questions until `requested` is reached.
pub fn synthesize(
    text: &str,
    subject: Subject,
    terms: &[String],
    sentences: &[String],
    requested: usize,
) -> Vec<Question> {
    if !is_usable_text(text) {
        return vec![unreadable_document_question()];
    }

    let requested = requested.max(1);
    let mut questions = Vec::with_capacity(requested);

    for term in terms.iter().take(requested) {
        let needle = term.to_lowercase();
        let context = sentences
            .iter()
            .find(|s| s.to_lowercase().contains(&needle));
        questions.push(match context {
            Some(sentence) => term_question_with_context(term, sentence),
            None => term_role_question(term, subject),
        });
    }

    if !sentences.is_empty() {
        for question in comprehension_questions(subject) {
            if questions.len() >= requested {
                break;
            }
            questions.push(question);
        }
    }

    while questions.len() < requested {
        let number = questions.len() + 1;
        questions.push(subject_filler_question(subject, number));
    }

    questions.truncate(requested);
    questions
}

/// Questions for an upload whose text could not be read at all.
///
/// Produces exactly `requested` questions (at least one): a canned opener
/// followed by numbered study-approach questions.
pub fn unreadable_document_fill(requested: usize) -> Vec<Question> {
    let requested = requested.max(1);
    let mut questions = vec![templated(
        "Based on the uploaded PDF document, what should students focus on?",
        [
            "Study the material thoroughly as it contains important educational content".into(),
            "Skip the document as it's not readable".into(),
            "Only look at images and diagrams".into(),
            "Memorize the document title only".into(),
        ],
        "Even when text extraction is limited, the uploaded PDF likely contains valuable \
         educational content that should be studied carefully.",
    )];

    while questions.len() < requested {
        let number = questions.len() + 1;
        questions.push(templated(
            format!(
                "What approach should students take when studying this PDF material? (Question {number})"
            ),
            [
                "Read carefully and take notes on key concepts".into(),
                "Scan quickly without taking notes".into(),
                "Focus only on the first page".into(),
                "Skip difficult sections entirely".into(),
            ],
            "Careful reading and note-taking are essential for understanding PDF-based \
             educational materials.",
        ));
    }
    questions
}

/// The single question returned for unreadable text.
pub fn unreadable_document_question() -> Question {
    templated(
        "What is the main topic of this document?",
        [
            "The document contains educational content for study".into(),
            "The document is empty".into(),
            "The document is corrupted".into(),
            "The document is not readable".into(),
        ],
        "Based on the uploaded PDF, this appears to be educational material.",
    )
}

fn term_question_with_context(term: &str, sentence: &str) -> Question {
    let quote: String = sentence.chars().take(QUOTE_CHARS).collect();
    templated(
        format!("Based on the document, what is mentioned about \"{term}\"?"),
        [
            format!("The document discusses {term} as an important concept"),
            format!("{term} is briefly mentioned without detail"),
            format!("{term} is not relevant to the main topic"),
            format!("{term} is only used as an example"),
        ],
        format!("According to the PDF content: \"{quote}...\""),
    )
}

fn term_role_question(term: &str, subject: Subject) -> Question {
    templated(
        format!("In the context of this {subject} material, what role does \"{term}\" play?"),
        [
            format!("{term} is a key concept discussed in the document"),
            format!("{term} is mentioned only in passing"),
            format!("{term} is not covered in this material"),
            format!("{term} is used incorrectly in the document"),
        ],
        format!(
            "The term \"{term}\" appears frequently in the PDF, indicating its importance to the subject matter."
        ),
    )
}

fn comprehension_questions(subject: Subject) -> [Question; 2] {
    [
        templated(
            "What is the primary focus of this document?",
            [
                format!("Understanding key concepts in {subject}"),
                "Providing a brief overview only".into(),
                "Testing existing knowledge".into(),
                "Offering entertainment content".into(),
            ],
            format!(
                "Based on the content analysis, this document focuses on {subject} concepts and principles."
            ),
        ),
        templated(
            "According to the document, what approach should students take to learn this material?",
            [
                "Study the concepts thoroughly and understand their applications".into(),
                "Memorize the content without understanding".into(),
                "Skip difficult sections".into(),
                "Focus only on definitions".into(),
            ],
            "The document content suggests comprehensive understanding is important for \
             mastering the material.",
        ),
    ]
}

fn subject_filler_question(subject: Subject, number: usize) -> Question {
    templated(
        format!("What can be concluded from studying this {subject} material? (Question {number})"),
        [
            format!("The material provides comprehensive coverage of important {subject} topics"),
            "The material is too basic for serious study".into(),
            "The material is outdated and not useful".into(),
            "The material is only suitable for beginners".into(),
        ],
        format!("Based on the analysis of the PDF content, this material covers relevant {subject} concepts."),
    )
}

/// A template question: correct answer first.
fn templated(
    prompt: impl Into<String>,
    options: [String; OPTION_COUNT],
    explanation: impl Into<String>,
) -> Question {
    Question {
        prompt: prompt.into(),
        options,
        correct_option_index: 0,
        explanation: explanation.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::mine::{mine_sentences, mine_terms};

    const TEXT: &str = "Photosynthesis converts light energy into chemical energy. \
        Chlorophyll absorbs light in the chloroplasts of every plant cell. \
        Photosynthesis releases oxygen as a byproduct of splitting water.";

    fn run(text: &str, requested: usize) -> Vec<Question> {
        let subject = classify(text);
        let terms = mine_terms(text);
        let sentences = mine_sentences(text);
        synthesize(text, subject, &terms, &sentences, requested)
    }

    #[test]
    fn unreadable_text_gives_one_question() {
        for requested in [1, 10, 50] {
            let questions = synthesize("", Subject::General, &[], &[], requested);
            assert_eq!(questions.len(), 1);
            assert!(questions[0].options[3].contains("not readable"));
        }
        let short = synthesize("too short to read", Subject::General, &[], &[], 10);
        assert_eq!(short, vec![unreadable_document_question()]);
    }

    #[test]
    fn produces_exactly_requested_count() {
        for requested in [1, 5, 10, 25, 50] {
            let questions = run(TEXT, requested);
            assert_eq!(questions.len(), requested);
            for q in &questions {
                assert_eq!(q.options.len(), 4);
                assert_eq!(q.correct_option_index, 0);
                assert!(q.validate().is_ok());
            }
        }
    }

    #[test]
    fn term_questions_quote_context_sentence() {
        let questions = run(TEXT, 5);
        assert_eq!(
            questions[0].prompt,
            "Based on the document, what is mentioned about \"photosynthesis\"?"
        );
        assert_eq!(
            questions[0].explanation,
            "According to the PDF content: \"Photosynthesis converts light energy into chemical energy...\""
        );
        assert_eq!(
            questions[0].correct_option(),
            "The document discusses photosynthesis as an important concept"
        );
    }

    #[test]
    fn quote_is_truncated_to_one_hundred_chars() {
        let sentence = format!("Osmosis {}", "moves water across membranes ".repeat(6));
        let text = format!("{sentence}.");
        let terms = vec!["osmosis".to_string()];
        let sentences = vec![sentence.trim().to_string()];
        let questions = synthesize(&text, Subject::Biology, &terms, &sentences, 1);
        let quote: String = sentence.chars().take(100).collect();
        assert_eq!(
            questions[0].explanation,
            format!("According to the PDF content: \"{quote}...\"")
        );
    }

    #[test]
    fn term_without_sentence_gets_role_question() {
        let text = "x".repeat(60);
        let terms = vec!["mitosis".to_string()];
        let questions = synthesize(&text, Subject::Biology, &terms, &[], 3);
        assert_eq!(
            questions[0].prompt,
            "In the context of this Biology material, what role does \"mitosis\" play?"
        );
        // No sentences: no comprehension questions, straight to filler.
        assert_eq!(
            questions[1].prompt,
            "What can be concluded from studying this Biology material? (Question 2)"
        );
        assert_eq!(
            questions[2].prompt,
            "What can be concluded from studying this Biology material? (Question 3)"
        );
    }

    #[test]
    fn comprehension_then_filler_after_terms() {
        let text = "y".repeat(60);
        let terms = vec!["tectonics".to_string()];
        let sentences = vec!["Plate tectonics shapes every continent over time".to_string()];
        let questions = synthesize(&text, Subject::Geography, &terms, &sentences, 5);
        assert_eq!(questions.len(), 5);
        assert!(questions[0].explanation.contains("Plate tectonics"));
        assert_eq!(questions[1].prompt, "What is the primary focus of this document?");
        assert_eq!(questions[1].options[0], "Understanding key concepts in Geography");
        assert!(questions[2].prompt.starts_with("According to the document"));
        assert!(questions[3].prompt.ends_with("(Question 4)"));
        assert!(questions[4].prompt.ends_with("(Question 5)"));
    }

    #[test]
    fn terms_are_capped_by_requested_count() {
        let text = "z".repeat(60);
        let terms: Vec<String> = (0..10).map(|i| format!("term{i}")).collect();
        let questions = synthesize(&text, Subject::General, &terms, &[], 4);
        assert_eq!(questions.len(), 4);
        assert!(questions[3].prompt.contains("term3"));
    }

    #[test]
    fn context_match_is_case_insensitive() {
        let text = "w".repeat(60);
        let terms = vec!["dna".to_string()];
        let sentences = vec!["The DNA molecule forms a double helix structure".to_string()];
        let questions = synthesize(&text, Subject::Biology, &terms, &sentences, 1);
        assert!(questions[0].explanation.contains("double helix"));
    }

    #[test]
    fn unreadable_fill_matches_requested_count() {
        let questions = unreadable_document_fill(7);
        assert_eq!(questions.len(), 7);
        assert!(questions[0].prompt.contains("what should students focus on"));
        assert!(questions[6].prompt.ends_with("(Question 7)"));
        assert!(questions.iter().all(|q| q.correct_option_index == 0));
        assert_eq!(unreadable_document_fill(0).len(), 1);
    }
}

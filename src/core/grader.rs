// src/core/grader.rs

use std::collections::BTreeSet;

use crate::core::answers::AnswerSheet;
use crate::models::question::AnswerOption;
use crate::models::result::ResultDetail;

/// One presented question as the grader sees it: identity, original pool
/// index, and the authoritative option list (with correct flags).
#[derive(Debug)]
pub struct GradeInput<'a> {
    pub question_id: &'a str,
    pub question_index: usize,
    pub options: &'a [AnswerOption],
}

#[derive(Debug)]
pub struct Graded {
    /// Aggregate score, floor-rounded integer in [0, 100].
    pub score: i64,
    pub details: Vec<ResultDetail>,
}

/// Indices of the options flagged correct.
pub fn correct_answer(options: &[AnswerOption]) -> BTreeSet<usize> {
    options
        .iter()
        .enumerate()
        .filter(|(_, opt)| opt.correct)
        .map(|(i, _)| i)
        .collect()
}

/// Multi-select is derived, never stored: more than one correct option.
pub fn is_multi_select(options: &[AnswerOption]) -> bool {
    options.iter().filter(|opt| opt.correct).count() > 1
}

/// Grades a presented set against an answer sheet. Pure: persistence of
/// the outcome is the caller's concern.
///
/// A question is correct only on exact set equality between the selected
/// and correct option sets -- selecting a superset or subset of a
/// multi-select answer fails it. The aggregate score floor-rounds, so
/// 2 of 3 correct scores 66.
pub fn grade(presented: &[GradeInput<'_>], sheet: &AnswerSheet) -> Graded {
    let empty = BTreeSet::new();
    let mut correct_count: i64 = 0;
    let mut details = Vec::with_capacity(presented.len());

    for (slot, input) in presented.iter().enumerate() {
        let selected = sheet.selected(slot).unwrap_or(&empty);
        let correct = correct_answer(input.options);
        let answered_correctly = *selected == correct;
        if answered_correctly {
            correct_count += 1;
        }
        details.push(ResultDetail {
            question_id: input.question_id.to_owned(),
            question_index: input.question_index,
            // Sorted list form is for serialization only; the comparison
            // above ran on the sets.
            selected_answer: selected.iter().copied().collect(),
            correct_answer: correct.iter().copied().collect(),
            answered_correctly,
        });
    }

    let score = if presented.is_empty() {
        0
    } else {
        100 * correct_count / presented.len() as i64
    };

    Graded { score, details }
}

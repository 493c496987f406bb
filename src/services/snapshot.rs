//! Assembly of the nested quiz state served to polling clients.
//!
//! Everything score-related is recomputed here on every call; the only
//! persisted inputs are the raw answers and the configured values.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::models::{Answer, Question, Quiz, Section, Value};
use crate::db::{
    AnswerRepository, QuestionRepository, SectionRepository, UserRepository, ValueRepository,
};
use crate::error::AppResult;
use crate::scoring;

#[derive(Debug, Serialize)]
pub struct QuizSnapshot {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub sections: Vec<SectionSnapshot>,
    pub points: f64,
}

#[derive(Debug, Serialize)]
pub struct SectionSnapshot {
    pub id: i64,
    pub name: String,
    pub order_number: Option<i32>,
    pub user: String,
    pub open: bool,
    pub closed: bool,
    pub questions: Vec<QuestionSnapshot>,
    pub points: Option<f64>,
    pub average: Option<f64>,
    pub host: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionSnapshot {
    pub id: i64,
    pub order_number: Option<i32>,
    pub content: Option<String>,
    pub answer_content: Option<String>,
    pub max_answers: i32,
    pub base_points: i32,
    pub open: bool,
    /// Not answerable by the viewer: locked, or a bonus question whose
    /// one attempt was already spent elsewhere in the section.
    pub closed: bool,
    pub likes: usize,
    pub liked: bool,
    pub values: Option<Vec<String>>,
    /// The viewer's own submissions; points stay hidden until the
    /// question or its section closes.
    pub answers: BTreeMap<String, Option<f64>>,
    pub points: Option<f64>,
    pub average: Option<f64>,
    pub correct: Vec<String>,
    pub host: bool,
    pub bonus: bool,
}

/// Raw rows backing one snapshot.
pub struct SnapshotData {
    pub quiz: Quiz,
    pub sections: Vec<Section>,
    pub questions: Vec<Question>,
    pub values: Vec<Value>,
    pub answers: Vec<Answer>,
    pub likes: Vec<(i64, i64)>,
    pub owners: HashMap<i64, String>,
}

pub async fn build(
    pool: &PgPool,
    quiz: Quiz,
    viewer_id: i64,
    cached_content: &[i64],
    cached_answers: &[i64],
) -> AppResult<QuizSnapshot> {
    let sections = SectionRepository::list_by_quiz(pool, quiz.id).await?;
    let questions = QuestionRepository::list_by_quiz(pool, quiz.id).await?;
    let values = ValueRepository::list_by_quiz(pool, quiz.id).await?;
    let answers = AnswerRepository::list_by_quiz(pool, quiz.id).await?;
    let likes = QuestionRepository::likes_by_quiz(pool, quiz.id).await?;

    let owner_ids: Vec<i64> = sections.iter().filter_map(|s| s.user_id).collect();
    let owners = UserRepository::get_by_ids(pool, &owner_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user.username))
        .collect();

    let data = SnapshotData {
        quiz,
        sections,
        questions,
        values,
        answers,
        likes,
        owners,
    };

    Ok(assemble(&data, viewer_id, cached_content, cached_answers))
}

pub fn assemble(
    data: &SnapshotData,
    viewer_id: i64,
    cached_content: &[i64],
    cached_answers: &[i64],
) -> QuizSnapshot {
    let mut questions_by_section: HashMap<i64, Vec<&Question>> = HashMap::new();
    for question in &data.questions {
        questions_by_section
            .entry(question.container_id)
            .or_default()
            .push(question);
    }

    let mut values_by_question: HashMap<i64, Vec<Value>> = HashMap::new();
    for value in &data.values {
        values_by_question
            .entry(value.question_id)
            .or_default()
            .push(value.clone());
    }

    let mut answers_by_question: HashMap<i64, Vec<&Answer>> = HashMap::new();
    for answer in &data.answers {
        answers_by_question
            .entry(answer.question_id)
            .or_default()
            .push(answer);
    }

    let mut likes_by_question: HashMap<i64, HashSet<i64>> = HashMap::new();
    for (question_id, user_id) in &data.likes {
        likes_by_question
            .entry(*question_id)
            .or_default()
            .insert(*user_id);
    }

    let question_by_id: HashMap<i64, &Question> =
        data.questions.iter().map(|q| (q.id, q)).collect();

    let score_of = |answer: &Answer| -> f64 {
        let Some(question) = question_by_id.get(&answer.question_id) else {
            return 0.0;
        };
        let values = values_by_question
            .get(&answer.question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        scoring::score(&answer.value, values, question.base_points)
    };

    let question_points = |user_id: i64, question_id: i64| -> f64 {
        answers_by_question
            .get(&question_id)
            .map(|answers| {
                answers
                    .iter()
                    .filter(|a| a.user_id == user_id)
                    .map(|a| score_of(a))
                    .sum()
            })
            .unwrap_or(0.0)
    };

    let empty = Vec::new();
    let mut sections = Vec::with_capacity(data.sections.len());
    let mut quiz_points = 0.0;

    for section in &data.sections {
        let section_questions = questions_by_section.get(&section.id).unwrap_or(&empty);
        let is_host = section.user_id == Some(viewer_id);

        // Per-participant totals, section owner excluded.
        let mut totals: HashMap<i64, f64> = HashMap::new();
        for question in section_questions {
            if let Some(answers) = answers_by_question.get(&question.id) {
                for answer in answers {
                    if Some(answer.user_id) != section.user_id {
                        totals.entry(answer.user_id).or_insert(0.0);
                    }
                }
            }
        }
        for (user_id, total) in totals.iter_mut() {
            *total = section_questions
                .iter()
                .map(|q| question_points(*user_id, q.id))
                .sum();
        }

        // The owner "scores" whatever the best participant reached.
        let viewer_section_points = if is_host {
            totals.values().copied().reduce(f64::max).unwrap_or(0.0)
        } else {
            section_questions
                .iter()
                .map(|q| question_points(viewer_id, q.id))
                .sum()
        };

        let average = totals.values().sum::<f64>() / totals.len().max(1) as f64;

        let all_questions_closed = section_questions.iter().all(|q| q.closed);

        let mut question_snapshots = Vec::new();
        for question in section_questions {
            if !is_host && !question.open {
                continue;
            }

            let bonus_spent = question.bonus
                && section_questions.iter().any(|other| {
                    other.bonus
                        && other.id != question.id
                        && answers_by_question
                            .get(&other.id)
                            .is_some_and(|answers| answers.iter().any(|a| a.user_id == viewer_id))
                });
            let answerable = !question.closed && !bonus_spent;

            let likes = likes_by_question.get(&question.id);
            let reveal_points = section.closed || question.closed;

            let own_answers: BTreeMap<String, Option<f64>> = answers_by_question
                .get(&question.id)
                .map(|answers| {
                    answers
                        .iter()
                        .filter(|a| a.user_id == viewer_id)
                        .map(|a| {
                            let points = reveal_points.then(|| score_of(a));
                            (a.value.clone(), points)
                        })
                        .collect()
                })
                .unwrap_or_default();

            let question_values = values_by_question
                .get(&question.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            // Average over everyone who answered, owner excluded.
            let answered_by: HashSet<i64> = answers_by_question
                .get(&question.id)
                .map(|answers| {
                    answers
                        .iter()
                        .filter(|a| Some(a.user_id) != section.user_id)
                        .map(|a| a.user_id)
                        .collect()
                })
                .unwrap_or_default();
            let question_average = answered_by
                .iter()
                .map(|user_id| question_points(*user_id, question.id))
                .sum::<f64>()
                / answered_by.len().max(1) as f64;

            question_snapshots.push(QuestionSnapshot {
                id: question.id,
                order_number: question.order_number,
                content: (question.open && !cached_content.contains(&question.id))
                    .then(|| question.content.clone())
                    .flatten(),
                answer_content: (section.closed && !cached_answers.contains(&question.id))
                    .then(|| question.answer_content.clone())
                    .flatten(),
                max_answers: question.max_answers,
                base_points: question.base_points,
                open: question.open,
                closed: !answerable,
                likes: likes.map_or(0, HashSet::len),
                liked: likes.is_some_and(|users| users.contains(&viewer_id)),
                values: question
                    .show_values
                    .then(|| question_values.iter().map(|v| v.text.clone()).collect()),
                answers: own_answers,
                points: section
                    .closed
                    .then(|| question_points(viewer_id, question.id)),
                average: (question.closed || is_host).then_some(question_average),
                correct: if section.closed {
                    question_values
                        .iter()
                        .filter(|v| v.points > 0.0)
                        .map(|v| v.text.clone())
                        .collect()
                } else {
                    Vec::new()
                },
                host: is_host,
                bonus: question.bonus,
            });
        }

        if section.closed {
            quiz_points += viewer_section_points;
        }

        sections.push(SectionSnapshot {
            id: section.id,
            name: section.name.clone(),
            order_number: section.order_number,
            user: section
                .user_id
                .and_then(|id| data.owners.get(&id).cloned())
                .unwrap_or_default(),
            // Sections are always presented as open; hosts gate
            // visibility per question instead.
            open: true,
            closed: section.closed,
            questions: question_snapshots,
            points: (section.closed && all_questions_closed).then_some(viewer_section_points),
            average: (section.closed || is_host).then_some(average),
            host: is_host,
        });
    }

    QuizSnapshot {
        id: data.quiz.id,
        name: data.quiz.name.clone(),
        start_time: data.quiz.start_time,
        end_time: data.quiz.end_time,
        sections,
        points: quiz_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: i64 = 11;
    const ALICE: i64 = 22;
    const BOB: i64 = 33;

    fn quiz() -> Quiz {
        Quiz {
            id: 1,
            name: "Pub Quiz".to_string(),
            start_time: None,
            end_time: None,
            password: None,
            last_updated: None,
        }
    }

    fn section(id: i64) -> Section {
        Section {
            id,
            container_id: Some(1),
            user_id: Some(HOST),
            name: format!("Round {id}"),
            order_number: Some(1),
            open: true,
            closed: false,
        }
    }

    fn question(id: i64, section_id: i64) -> Question {
        Question {
            id,
            container_id: section_id,
            order_number: Some(1),
            content: Some(format!("Question {id}")),
            answer_content: Some(format!("Answer {id}")),
            show_values: false,
            max_answers: 1,
            base_points: 0,
            bonus: false,
            open: true,
            closed: false,
        }
    }

    fn value(id: i64, question_id: i64, text: &str, points: f64) -> Value {
        Value {
            id,
            question_id,
            text: text.to_string(),
            allowed_misses: 0,
            points,
            order_number: Some(1),
        }
    }

    fn answer(id: i64, user_id: i64, question_id: i64, text: &str) -> Answer {
        Answer {
            id,
            user_id,
            question_id,
            value: text.to_string(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn data() -> SnapshotData {
        SnapshotData {
            quiz: quiz(),
            sections: vec![section(100)],
            questions: vec![question(200, 100), question(201, 100)],
            values: vec![
                value(300, 200, "paris", 5.0),
                value(301, 201, "berlin", 3.0),
            ],
            answers: vec![
                answer(400, ALICE, 200, "paris"),
                answer(401, BOB, 200, "rome"),
                answer(402, BOB, 201, "berlin"),
            ],
            likes: vec![(200, ALICE)],
            owners: HashMap::from([(HOST, "host".to_string())]),
        }
    }

    #[test]
    fn participants_see_only_open_questions() {
        let mut data = data();
        data.questions[1].open = false;

        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(snapshot.sections[0].questions.len(), 1);
        assert_eq!(snapshot.sections[0].questions[0].id, 200);

        let snapshot = assemble(&data, HOST, &[], &[]);
        assert_eq!(snapshot.sections[0].questions.len(), 2);
        assert!(snapshot.sections[0].host);
    }

    #[test]
    fn content_is_withheld_when_cached_or_not_open() {
        let mut data = data();
        data.questions[1].open = false;

        let snapshot = assemble(&data, HOST, &[200], &[]);
        let questions = &snapshot.sections[0].questions;
        assert_eq!(questions[0].content, None);
        // Not open, so even the host gets no content for it.
        assert_eq!(questions[1].content, None);

        let snapshot = assemble(&data, HOST, &[], &[]);
        assert_eq!(
            snapshot.sections[0].questions[0].content.as_deref(),
            Some("Question 200")
        );
    }

    #[test]
    fn answer_content_and_correct_values_wait_for_section_close() {
        let mut data = data();
        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(snapshot.sections[0].questions[0].answer_content, None);
        assert!(snapshot.sections[0].questions[0].correct.is_empty());

        data.sections[0].closed = true;
        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(
            snapshot.sections[0].questions[0].answer_content.as_deref(),
            Some("Answer 200")
        );
        assert_eq!(snapshot.sections[0].questions[0].correct, vec!["paris"]);
    }

    #[test]
    fn own_answer_points_stay_hidden_until_close() {
        let mut data = data();
        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(
            snapshot.sections[0].questions[0].answers.get("paris"),
            Some(&None)
        );

        data.questions[0].closed = true;
        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(
            snapshot.sections[0].questions[0].answers.get("paris"),
            Some(&Some(5.0))
        );
    }

    #[test]
    fn closed_sections_reveal_points_and_feed_the_quiz_total() {
        let mut data = data();
        data.sections[0].closed = true;
        for question in &mut data.questions {
            question.closed = true;
        }

        let snapshot = assemble(&data, BOB, &[], &[]);
        let section = &snapshot.sections[0];
        // Bob missed question 200 but took question 201.
        assert_eq!(section.points, Some(3.0));
        assert_eq!(snapshot.points, 3.0);

        // Points stay hidden while some questions are not yet closed.
        let mut data = self::data();
        data.sections[0].closed = true;
        let snapshot = assemble(&data, BOB, &[], &[]);
        assert_eq!(snapshot.sections[0].points, None);
        assert_eq!(snapshot.points, 3.0);
    }

    #[test]
    fn host_points_track_the_best_participant() {
        let mut data = data();
        data.sections[0].closed = true;
        for question in &mut data.questions {
            question.closed = true;
        }

        let snapshot = assemble(&data, HOST, &[], &[]);
        // Alice has 5, Bob has 3; the host shows the best score.
        assert_eq!(snapshot.sections[0].points, Some(5.0));
    }

    #[test]
    fn averages_exclude_the_section_owner() {
        let mut data = data();
        data.answers.push(answer(403, HOST, 200, "paris"));
        data.sections[0].closed = true;

        let snapshot = assemble(&data, ALICE, &[], &[]);
        // (5 + 3) / 2, the host's own perfect answer does not count.
        assert_eq!(snapshot.sections[0].average, Some(4.0));
    }

    #[test]
    fn bonus_attempt_locks_sibling_bonus_questions() {
        let mut data = data();
        data.questions[0].bonus = true;
        data.questions[1].bonus = true;
        data.answers = vec![answer(400, ALICE, 200, "paris")];

        let snapshot = assemble(&data, ALICE, &[], &[]);
        let questions = &snapshot.sections[0].questions;
        // The answered question itself stays answerable.
        assert!(!questions[0].closed);
        assert!(questions[1].closed);

        let snapshot = assemble(&data, BOB, &[], &[]);
        assert!(!snapshot.sections[0].questions[1].closed);
    }

    #[test]
    fn likes_are_counted_and_flagged() {
        let data = data();
        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(snapshot.sections[0].questions[0].likes, 1);
        assert!(snapshot.sections[0].questions[0].liked);

        let snapshot = assemble(&data, BOB, &[], &[]);
        assert!(!snapshot.sections[0].questions[0].liked);
    }

    #[test]
    fn shown_values_include_distractors_in_order() {
        let mut data = data();
        data.questions[0].show_values = true;
        data.values.push(Value {
            id: 302,
            question_id: 200,
            text: "rome".to_string(),
            allowed_misses: 0,
            points: 0.0,
            order_number: Some(2),
        });

        let snapshot = assemble(&data, ALICE, &[], &[]);
        assert_eq!(
            snapshot.sections[0].questions[0].values,
            Some(vec!["paris".to_string(), "rome".to_string()])
        );
    }
}

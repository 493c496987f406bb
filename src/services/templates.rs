//! Section scaffolding from the classic quiz-night round templates.

use sqlx::{Postgres, Transaction};

use crate::db::models::{NewQuestion, NewSection, Section, SectionTemplate};
use crate::db::{QuestionRepository, SectionRepository, ValueRepository};
use crate::error::{AppError, AppResult};
use crate::ordering;

pub struct QuestionSeed {
    pub content: String,
    pub show_values: bool,
    pub bonus: bool,
    pub order_number: i32,
    pub values: Vec<ValueSeed>,
}

pub struct ValueSeed {
    pub text: String,
    pub allowed_misses: i32,
    pub points: f64,
    pub order_number: Option<i32>,
}

/// Create a section, position it through the ordering engine and fill
/// it from the requested template.
pub async fn create_section(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    owner_id: i64,
    payload: &NewSection,
) -> AppResult<Section> {
    let seeds = expand(payload)?;

    let siblings = SectionRepository::siblings(tx, quiz_id).await?;
    let mut section =
        SectionRepository::create(tx, quiz_id, owner_id, &payload.name, None).await?;

    let assignments = ordering::set_order(&siblings, section.id, payload.order_number);
    SectionRepository::apply_order(tx, &assignments).await?;
    section.order_number = assignments
        .iter()
        .find(|a| a.id == section.id)
        .map(|a| a.order_number);

    for seed in seeds {
        let question = QuestionRepository::create(
            tx,
            section.id,
            &NewQuestion {
                content: Some(seed.content),
                show_values: seed.show_values,
                bonus: seed.bonus,
                ..Default::default()
            },
            Some(seed.order_number),
        )
        .await?;

        for value in seed.values {
            ValueRepository::create(
                tx,
                question.id,
                &value.text,
                value.allowed_misses,
                value.points,
                value.order_number,
            )
            .await?;
        }
    }

    Ok(section)
}

/// Expand a template into its question seeds. Sections without a
/// template start empty.
pub fn expand(payload: &NewSection) -> AppResult<Vec<QuestionSeed>> {
    let Some(template) = payload.template else {
        return Ok(Vec::new());
    };

    match template {
        SectionTemplate::Generic => Ok(generic(payload.number_of_questions.unwrap_or(10))),
        SectionTemplate::Multiple => Ok(multiple(
            payload.number_of_questions.unwrap_or(10),
            payload.number_of_choices.unwrap_or(4),
        )),
        SectionTemplate::Connection => {
            let answers = required(&payload.connection, "connection")?;
            Ok(connection(
                payload.number_of_questions.unwrap_or(10),
                payload.opportunities.unwrap_or(3),
                &answers,
            ))
        }
        SectionTemplate::Whoami => {
            let answers = required(&payload.answer, "answer")?;
            Ok(whoami(payload.number_of_questions.unwrap_or(5), &answers))
        }
    }
}

fn required(field: &Option<String>, name: &str) -> AppResult<Vec<String>> {
    let answers: Vec<String> = field
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();

    if answers.is_empty() {
        return Err(AppError::Validation(format!(
            "the {name} template needs a comma-separated {name} list"
        )));
    }
    Ok(answers)
}

fn fuzzy_threshold(text: &str) -> i32 {
    text.chars().count() as i32 / 4 + 1
}

fn generic(questions: i32) -> Vec<QuestionSeed> {
    (0..questions)
        .map(|i| QuestionSeed {
            content: format!("Question {}", i + 1),
            show_values: false,
            bonus: false,
            order_number: i + 1,
            values: vec![ValueSeed {
                text: "Answer".to_string(),
                allowed_misses: 3,
                points: 1.0,
                order_number: None,
            }],
        })
        .collect()
}

fn multiple(questions: i32, choices: i32) -> Vec<QuestionSeed> {
    (0..questions)
        .map(|i| QuestionSeed {
            content: format!("Question {}", i + 1),
            show_values: true,
            bonus: false,
            order_number: i + 1,
            values: (0..choices)
                .map(|j| ValueSeed {
                    text: "Answer".to_string(),
                    allowed_misses: 0,
                    points: 0.0,
                    order_number: Some(j + 1),
                })
                .collect(),
        })
        .collect()
}

/// Track questions interleaved with bonus "what is the connection?"
/// questions whose reward decays the later the connection is guessed.
fn connection(questions: i32, opportunities: i32, answers: &[String]) -> Vec<QuestionSeed> {
    let mut seeds = Vec::new();
    let mut order_number = 1;

    for i in 0..questions - 1 {
        seeds.push(QuestionSeed {
            content: format!("Question {}", i + 1),
            show_values: false,
            bonus: false,
            order_number,
            values: vec![ValueSeed {
                text: "Answer".to_string(),
                allowed_misses: 3,
                points: 1.0,
                order_number: None,
            }],
        });
        order_number += 1;

        if i < opportunities {
            seeds.push(QuestionSeed {
                content: format!("What is the connection? (+{}/-1)", opportunities - i),
                show_values: false,
                bonus: true,
                order_number,
                values: connection_values(answers, f64::from(opportunities + 1 - i)),
            });
            order_number += 1;
        }
    }

    seeds.push(QuestionSeed {
        content: "What is the connection?".to_string(),
        show_values: false,
        bonus: true,
        order_number,
        values: connection_values(answers, 1.0),
    });

    seeds
}

fn connection_values(answers: &[String], points: f64) -> Vec<ValueSeed> {
    answers
        .iter()
        .map(|text| ValueSeed {
            text: text.clone(),
            allowed_misses: fuzzy_threshold(text),
            points,
            order_number: None,
        })
        .collect()
}

fn whoami(questions: i32, answers: &[String]) -> Vec<QuestionSeed> {
    (0..questions)
        .map(|i| QuestionSeed {
            content: format!("Statement {}", i + 1),
            show_values: false,
            bonus: true,
            order_number: i + 1,
            values: connection_values(answers, f64::from(questions - i)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(template: SectionTemplate) -> NewSection {
        NewSection {
            name: "Round".to_string(),
            order_number: None,
            template: Some(template),
            number_of_questions: None,
            number_of_choices: None,
            opportunities: None,
            connection: Some("alpha, beta".to_string()),
            answer: Some("gamma".to_string()),
        }
    }

    #[test]
    fn generic_template_numbers_questions() {
        let seeds = expand(&payload(SectionTemplate::Generic)).unwrap();
        assert_eq!(seeds.len(), 10);
        assert_eq!(seeds[0].content, "Question 1");
        assert_eq!(seeds[9].order_number, 10);
        assert_eq!(seeds[0].values[0].allowed_misses, 3);
        assert_eq!(seeds[0].values[0].points, 1.0);
    }

    #[test]
    fn multiple_choice_template_creates_zero_point_choices() {
        let mut payload = payload(SectionTemplate::Multiple);
        payload.number_of_questions = Some(2);
        payload.number_of_choices = Some(3);

        let seeds = expand(&payload).unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].show_values);
        assert_eq!(seeds[0].values.len(), 3);
        assert!(seeds[0].values.iter().all(|v| v.points == 0.0));
        assert_eq!(seeds[0].values[2].order_number, Some(3));
    }

    #[test]
    fn connection_template_interleaves_decaying_bonus_questions() {
        let mut payload = payload(SectionTemplate::Connection);
        payload.number_of_questions = Some(4);
        payload.opportunities = Some(2);

        let seeds = expand(&payload).unwrap();
        // 3 track questions, 2 early connection chances, 1 final chance.
        assert_eq!(seeds.len(), 6);

        let bonuses: Vec<&QuestionSeed> = seeds.iter().filter(|s| s.bonus).collect();
        assert_eq!(bonuses.len(), 3);
        assert_eq!(bonuses[0].content, "What is the connection? (+2/-1)");
        assert_eq!(bonuses[0].values[0].points, 3.0);
        assert_eq!(bonuses[1].values[0].points, 2.0);
        assert_eq!(bonuses[2].content, "What is the connection?");
        assert_eq!(bonuses[2].values[0].points, 1.0);

        // Order numbers are a dense 1..=6 sequence.
        let orders: Vec<i32> = seeds.iter().map(|s| s.order_number).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);

        // Every accepted spelling of the connection is present.
        assert_eq!(bonuses[0].values.len(), 2);
        assert_eq!(bonuses[0].values[1].text, "beta");
    }

    #[test]
    fn whoami_template_rewards_early_guesses() {
        let mut payload = payload(SectionTemplate::Whoami);
        payload.number_of_questions = Some(3);

        let seeds = expand(&payload).unwrap();
        assert_eq!(seeds.len(), 3);
        assert!(seeds.iter().all(|s| s.bonus));
        assert_eq!(seeds[0].values[0].points, 3.0);
        assert_eq!(seeds[2].values[0].points, 1.0);
        // "gamma" is five characters, so two misses are tolerated.
        assert_eq!(seeds[0].values[0].allowed_misses, 2);
    }

    #[test]
    fn missing_connection_list_is_rejected() {
        let mut payload = payload(SectionTemplate::Connection);
        payload.connection = Some("  ".to_string());
        assert!(expand(&payload).is_err());
    }

    #[test]
    fn sections_without_a_template_start_empty() {
        let mut payload = payload(SectionTemplate::Generic);
        payload.template = None;
        assert!(expand(&payload).unwrap().is_empty());
    }
}

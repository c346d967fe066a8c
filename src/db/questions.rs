//! Test catalog and question queries

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result};

use crate::domain::{AnswerLetter, AnswerOptions, Difficulty, Domain, PracticeTest, Question, QuestionFilter, Section};

const QUESTION_COLUMNS: &str = r#"id, test_id, section, module_number, question_text,
           option_a, option_b, option_c, option_d, correct_answer, explanation,
           difficulty, domain, topic, order_index"#;

// ==================== Tests ====================

pub fn insert_test(
    conn: &Connection,
    id: &str,
    title: &str,
    description: Option<&str>,
    is_published: bool,
) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO tests (id, title, description, is_published, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![id, title, description, is_published, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Tests newest first. Unpublished tests are only included when asked for.
pub fn list_tests(conn: &Connection, include_unpublished: bool) -> Result<Vec<PracticeTest>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT t.id, t.title, t.description, t.is_published, t.created_at,
           (SELECT COUNT(*) FROM questions q WHERE q.test_id = t.id)
    FROM tests t
    WHERE t.is_published = 1 OR ?1
    ORDER BY t.created_at DESC, t.rowid DESC
    "#,
    )?;

    let tests = stmt
        .query_map(params![include_unpublished], row_to_test)?
        .collect::<Result<Vec<_>>>()?;
    Ok(tests)
}

pub fn get_test(conn: &Connection, id: &str) -> Result<Option<PracticeTest>> {
    conn.query_row(
        r#"
    SELECT t.id, t.title, t.description, t.is_published, t.created_at,
           (SELECT COUNT(*) FROM questions q WHERE q.test_id = t.id)
    FROM tests t WHERE t.id = ?1
    "#,
        params![id],
        row_to_test,
    )
    .optional()
}

fn row_to_test(row: &rusqlite::Row) -> Result<PracticeTest> {
    let created_at: String = row.get(4)?;
    Ok(PracticeTest {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_published: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        question_count: row.get(5)?,
    })
}

// ==================== Questions ====================

/// Insert a question after checking its structural rules.
/// A rule violation is reported as a conversion failure carrying the message.
pub fn insert_question(conn: &Connection, question: &Question) -> Result<()> {
    question
        .validate()
        .map_err(|msg| rusqlite::Error::ToSqlConversionFailure(msg.into()))?;

    let [a, b, c, d] = &question.options.0;
    conn.execute(
        r#"
    INSERT INTO questions (id, test_id, section, module_number, question_text,
                           option_a, option_b, option_c, option_d, correct_answer, explanation,
                           difficulty, domain, topic, order_index, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
    "#,
        params![
            question.id,
            question.test_id,
            question.section.as_str(),
            question.module_number,
            question.question_text,
            a,
            b,
            c,
            d,
            question.correct_answer.as_str(),
            question.explanation,
            question.difficulty.as_str(),
            question.domain.map(|d| d.as_str()),
            question.topic,
            question.order_index,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Questions of one test, ascending by order index (unordered rows last)
pub fn load_test_questions(conn: &Connection, test_id: &str) -> Result<Vec<Question>> {
    let sql = format!(
        r#"
    SELECT {}
    FROM questions
    WHERE test_id = ?1
    ORDER BY order_index IS NULL, order_index ASC, rowid ASC
    "#,
        QUESTION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let questions = stmt
        .query_map(params![test_id], row_to_question)?
        .collect::<Result<Vec<_>>>()?;
    Ok(questions)
}

/// Topic-practice questions from the pool (questions not owned by a test),
/// in storage order
pub fn load_practice_questions(conn: &Connection, filter: &QuestionFilter) -> Result<Vec<Question>> {
    let mut clauses = vec!["test_id IS NULL".to_string()];
    let mut values: Vec<String> = Vec::new();

    let mut push = |column: &str, value: String| {
        values.push(value);
        clauses.push(format!("{} = ?{}", column, values.len()));
    };
    if let Some(section) = filter.section {
        push("section", section.as_str().to_string());
    }
    if let Some(domain) = filter.domain {
        push("domain", domain.as_str().to_string());
    }
    if let Some(difficulty) = filter.difficulty {
        push("difficulty", difficulty.as_str().to_string());
    }
    if let Some(topic) = filter.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        push("topic", topic.to_string());
    }

    let sql = format!(
        r#"
    SELECT {}
    FROM questions
    WHERE {}
    ORDER BY rowid ASC
    LIMIT {}
    "#,
        QUESTION_COLUMNS,
        clauses.join(" AND "),
        filter.effective_limit()
    );
    let mut stmt = conn.prepare(&sql)?;
    let questions = stmt
        .query_map(params_from_iter(values.iter()), row_to_question)?
        .collect::<Result<Vec<_>>>()?;
    Ok(questions)
}

fn invalid_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("unexpected value '{}'", value).into())
}

pub(crate) fn row_to_question(row: &rusqlite::Row) -> Result<Question> {
    let section_str: String = row.get(2)?;
    let correct_str: String = row.get(9)?;
    let difficulty_str: String = row.get(11)?;
    let domain_str: Option<String> = row.get(12)?;

    Ok(Question {
        id: row.get(0)?,
        test_id: row.get(1)?,
        section: Section::from_str(&section_str).ok_or_else(|| invalid_column(2, &section_str))?,
        module_number: row.get(3)?,
        question_text: row.get(4)?,
        options: AnswerOptions([row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?]),
        correct_answer: AnswerLetter::from_str(&correct_str).ok_or_else(|| invalid_column(9, &correct_str))?,
        explanation: row.get(10)?,
        difficulty: Difficulty::from_str(&difficulty_str).ok_or_else(|| invalid_column(11, &difficulty_str))?,
        domain: match domain_str.as_deref() {
            None => None,
            Some(s) => Some(Domain::from_str(s).ok_or_else(|| invalid_column(12, s))?),
        },
        topic: row.get(13)?,
        order_index: row.get(14)?,
    })
}

//! Test attempts and their per-question answers

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{AnswerLetter, ReviewFilter, ReviewItem, TestAttempt, UserAnswer};
use crate::scoring::ScoreReport;

use super::parse_timestamp;
use super::questions::row_to_question;

pub fn insert_attempt(conn: &Connection, attempt: &TestAttempt) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO test_attempts (id, user_id, test_id, started_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
        params![
            attempt.id,
            attempt.user_id,
            attempt.test_id,
            attempt.started_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_attempt(conn: &Connection, attempt_id: &str) -> Result<Option<TestAttempt>> {
    conn.query_row(
        r#"
    SELECT id, user_id, test_id, started_at, completed_at, total_score, rw_score, math_score,
           rw_correct, rw_total, math_correct, math_total
    FROM test_attempts WHERE id = ?1
    "#,
        params![attempt_id],
        row_to_attempt,
    )
    .optional()
}

/// Completed attempts of a user, newest first
pub fn list_completed_attempts(conn: &Connection, user_id: &str) -> Result<Vec<TestAttempt>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, user_id, test_id, started_at, completed_at, total_score, rw_score, math_score,
           rw_correct, rw_total, math_correct, math_total
    FROM test_attempts
    WHERE user_id = ?1 AND completed_at IS NOT NULL
    ORDER BY completed_at DESC
    "#,
    )?;
    let attempts = stmt
        .query_map(params![user_id], row_to_attempt)?
        .collect::<Result<Vec<_>>>()?;
    Ok(attempts)
}

pub fn count_completed_attempts(conn: &Connection, user_id: &str) -> Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM test_attempts WHERE user_id = ?1 AND completed_at IS NOT NULL",
        params![user_id],
        |row| row.get(0),
    )
}

/// Upsert one answer row per (attempt, question) inside a single transaction.
/// Replaying the same batch leaves exactly one row per question.
pub fn save_answers(conn: &Connection, answers: &[UserAnswer]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
    INSERT INTO user_answers (id, attempt_id, question_id, selected_answer, is_correct, is_marked,
                              time_spent, answered_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(attempt_id, question_id) DO UPDATE SET
      selected_answer = excluded.selected_answer,
      is_correct = excluded.is_correct,
      is_marked = excluded.is_marked,
      time_spent = excluded.time_spent,
      answered_at = excluded.answered_at
    "#,
        )?;
        for answer in answers {
            stmt.execute(params![
                answer.id,
                answer.attempt_id,
                answer.question_id,
                answer.selected_answer.map(|l| l.as_str()),
                answer.is_correct,
                answer.is_marked,
                answer.time_spent,
                answer.answered_at.to_rfc3339(),
            ])?;
        }
    }
    tx.commit()
}

/// Write scores and completion time. Only touches attempts that are still in
/// progress; returns whether a row was updated.
pub fn complete_attempt(
    conn: &Connection,
    attempt_id: &str,
    report: &ScoreReport,
    completed_at: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE test_attempts
    SET completed_at = ?2, total_score = ?3, rw_score = ?4, math_score = ?5,
        rw_correct = ?6, rw_total = ?7, math_correct = ?8, math_total = ?9
    WHERE id = ?1 AND completed_at IS NULL
    "#,
        params![
            attempt_id,
            completed_at.to_rfc3339(),
            report.total_score,
            report.reading_writing.score,
            report.math.score,
            report.reading_writing.correct,
            report.reading_writing.total,
            report.math.correct,
            report.math.total,
        ],
    )?;
    Ok(updated > 0)
}

pub fn get_answers(conn: &Connection, attempt_id: &str) -> Result<Vec<UserAnswer>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, attempt_id, question_id, selected_answer, is_correct, is_marked, time_spent, answered_at
    FROM user_answers
    WHERE attempt_id = ?1
    ORDER BY answered_at ASC, rowid ASC
    "#,
    )?;
    let answers = stmt
        .query_map(params![attempt_id], |row| row_to_answer(row, 0))?
        .collect::<Result<Vec<_>>>()?;
    Ok(answers)
}

/// Answers joined with their questions, ordered by answer time then order index
pub fn list_review_answers(conn: &Connection, attempt_id: &str, filter: ReviewFilter) -> Result<Vec<ReviewItem>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT q.id, q.test_id, q.section, q.module_number, q.question_text,
           q.option_a, q.option_b, q.option_c, q.option_d, q.correct_answer, q.explanation,
           q.difficulty, q.domain, q.topic, q.order_index,
           ua.id, ua.attempt_id, ua.question_id, ua.selected_answer, ua.is_correct, ua.is_marked,
           ua.time_spent, ua.answered_at
    FROM user_answers ua
    JOIN questions q ON q.id = ua.question_id
    WHERE ua.attempt_id = ?1
    ORDER BY ua.answered_at ASC, q.order_index IS NULL, q.order_index ASC
    "#,
    )?;

    let items = stmt
        .query_map(params![attempt_id], |row| {
            Ok(ReviewItem {
                question: row_to_question(row)?,
                answer: row_to_answer(row, 15)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(items.into_iter().filter(|item| filter.matches(&item.answer)).collect())
}

fn row_to_attempt(row: &rusqlite::Row) -> Result<TestAttempt> {
    let started_at: Option<String> = row.get(3)?;
    Ok(TestAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        test_id: row.get(2)?,
        started_at: parse_timestamp(started_at).unwrap_or_else(Utc::now),
        completed_at: parse_timestamp(row.get(4)?),
        total_score: row.get(5)?,
        rw_score: row.get(6)?,
        math_score: row.get(7)?,
        rw_correct: row.get(8)?,
        rw_total: row.get(9)?,
        math_correct: row.get(10)?,
        math_total: row.get(11)?,
    })
}

/// Map an answer row whose columns start at `offset`
fn row_to_answer(row: &rusqlite::Row, offset: usize) -> Result<UserAnswer> {
    let selected: Option<String> = row.get(offset + 3)?;
    let answered_at: Option<String> = row.get(offset + 7)?;
    Ok(UserAnswer {
        id: row.get(offset)?,
        attempt_id: row.get(offset + 1)?,
        question_id: row.get(offset + 2)?,
        selected_answer: selected.as_deref().and_then(AnswerLetter::from_str),
        is_correct: row.get(offset + 4)?,
        is_marked: row.get(offset + 5)?,
        time_spent: row.get(offset + 6)?,
        answered_at: parse_timestamp(answered_at).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::questions::{insert_question, insert_test};
    use crate::domain::{Question, Section};
    use crate::scoring::score_answers;
    use crate::testing::{sample_question, TestEnv};

    struct Fixture {
        env: TestEnv,
        user: String,
        attempt: TestAttempt,
        questions: Vec<Question>,
    }

    fn fixture() -> Fixture {
        let env = TestEnv::new().unwrap();
        let user = env.create_user("student@example.com");
        insert_test(&env.conn, "t1", "Practice Test 1", None, true).unwrap();
        let questions = vec![
            sample_question("rw1", Some("t1"), Section::ReadingWriting),
            sample_question("m1", Some("t1"), Section::Math),
        ];
        for q in &questions {
            insert_question(&env.conn, q).unwrap();
        }
        let attempt = TestAttempt::new(&user, "t1", Utc::now());
        insert_attempt(&env.conn, &attempt).unwrap();
        Fixture { env, user, attempt, questions }
    }

    fn answers(f: &Fixture, rw: Option<AnswerLetter>, marked_math: bool) -> Vec<UserAnswer> {
        let now = Utc::now();
        vec![
            UserAnswer::for_question(&f.attempt.id, &f.questions[0], rw, false, 30, now),
            UserAnswer::for_question(&f.attempt.id, &f.questions[1], None, marked_math, 0, now),
        ]
    }

    #[test]
    fn test_save_answers_replay_keeps_one_row_per_question() {
        let f = fixture();
        let correct = f.questions[0].correct_answer;

        save_answers(&f.env.conn, &answers(&f, None, false)).unwrap();
        // Replay with fresh row ids and a changed answer
        save_answers(&f.env.conn, &answers(&f, Some(correct), true)).unwrap();

        let stored = get_answers(&f.env.conn, &f.attempt.id).unwrap();
        assert_eq!(stored.len(), 2);
        let rw = stored.iter().find(|a| a.question_id == "rw1").unwrap();
        assert_eq!(rw.selected_answer, Some(correct));
        assert!(rw.is_correct);
        assert_eq!(rw.time_spent, 30);
        let math = stored.iter().find(|a| a.question_id == "m1").unwrap();
        assert!(math.selected_answer.is_none());
        assert!(!math.is_correct);
        assert!(math.is_marked);
    }

    #[test]
    fn test_save_answers_is_all_or_nothing() {
        let f = fixture();
        let mut batch = answers(&f, None, false);
        // Second row violates the primary key of the first
        batch[1].id = batch[0].id.clone();
        assert!(save_answers(&f.env.conn, &batch).is_err());
        assert!(get_answers(&f.env.conn, &f.attempt.id).unwrap().is_empty());
    }

    #[test]
    fn test_complete_attempt_only_once() {
        let f = fixture();
        let batch = answers(&f, Some(f.questions[0].correct_answer), false);
        let report = score_answers(&f.questions, |q| batch.iter().find(|a| a.question_id == q.id).and_then(|a| a.selected_answer));

        assert_eq!(count_completed_attempts(&f.env.conn, &f.user).unwrap(), 0);
        assert!(complete_attempt(&f.env.conn, &f.attempt.id, &report, Utc::now()).unwrap());
        assert!(!complete_attempt(&f.env.conn, &f.attempt.id, &report, Utc::now()).unwrap());

        let stored = get_attempt(&f.env.conn, &f.attempt.id).unwrap().unwrap();
        assert!(stored.is_completed());
        assert_eq!(stored.rw_score, Some(800));
        assert_eq!(stored.math_score, Some(200));
        assert_eq!(stored.total_score, Some(1000));
        assert_eq!(stored.math_total, Some(1));
        assert_eq!(count_completed_attempts(&f.env.conn, &f.user).unwrap(), 1);
        assert_eq!(list_completed_attempts(&f.env.conn, &f.user).unwrap().len(), 1);
    }

    #[test]
    fn test_review_answers_filters() {
        let f = fixture();
        save_answers(&f.env.conn, &answers(&f, Some(f.questions[0].correct_answer), true)).unwrap();

        let all = list_review_answers(&f.env.conn, &f.attempt.id, ReviewFilter::All).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].question.id, all[0].answer.question_id);

        let wrong = list_review_answers(&f.env.conn, &f.attempt.id, ReviewFilter::Wrong).unwrap();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].question.id, "m1");

        let marked = list_review_answers(&f.env.conn, &f.attempt.id, ReviewFilter::Marked).unwrap();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].answer.is_marked);
    }

    #[test]
    fn test_get_missing_attempt() {
        let f = fixture();
        assert!(get_attempt(&f.env.conn, "nope").unwrap().is_none());
    }
}

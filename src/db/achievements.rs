//! Achievement catalog and per-user unlock records

use chrono::Utc;
use rusqlite::{params, Connection, Result};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{Achievement, RequirementType};

/// Default catalog: (key, name, description, icon, xp_reward, requirement_type, requirement_value)
const DEFAULT_ACHIEVEMENTS: &[(&str, &str, &str, &str, u32, RequirementType, u32)] = &[
    ("first_question", "First Steps", "Answer your first question", "target", 10, RequirementType::QuestionsAnswered, 1),
    ("questions_10", "Warming Up", "Answer 10 questions", "zap", 25, RequirementType::QuestionsAnswered, 10),
    ("questions_50", "Dedicated", "Answer 50 questions", "book-open", 50, RequirementType::QuestionsAnswered, 50),
    ("questions_100", "Century", "Answer 100 questions", "award", 100, RequirementType::QuestionsAnswered, 100),
    ("questions_500", "Question Machine", "Answer 500 questions", "brain", 250, RequirementType::QuestionsAnswered, 500),
    ("first_test", "Test Taker", "Complete your first practice test", "file-check", 50, RequirementType::TestsCompleted, 1),
    ("tests_5", "Test Veteran", "Complete 5 practice tests", "trophy", 150, RequirementType::TestsCompleted, 5),
    ("streak_3", "On a Roll", "Practice 3 days in a row", "flame", 30, RequirementType::StreakDays, 3),
    ("streak_7", "Week Warrior", "Practice 7 days in a row", "flame", 75, RequirementType::StreakDays, 7),
    ("streak_30", "Unstoppable", "Practice 30 days in a row", "crown", 300, RequirementType::StreakDays, 30),
];

/// Seed the default catalog. Existing keys are left untouched.
pub fn seed_achievements(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
    INSERT OR IGNORE INTO achievements
      (id, key, name, description, icon, xp_reward, requirement_type, requirement_value)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
    )?;

    let mut inserted = 0;
    for (key, name, description, icon, xp_reward, requirement_type, requirement_value) in DEFAULT_ACHIEVEMENTS {
        inserted += stmt.execute(params![
            Uuid::new_v4().to_string(),
            key,
            name,
            description,
            icon,
            xp_reward,
            requirement_type.as_str(),
            requirement_value,
        ])?;
    }
    if inserted > 0 {
        tracing::info!("Seeded {} achievements", inserted);
    }
    Ok(())
}

/// Full catalog ordered by requirement then threshold.
/// Rows with an unknown requirement type are skipped.
pub fn list_achievements(conn: &Connection) -> Result<Vec<Achievement>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, key, name, description, icon, xp_reward, requirement_type, requirement_value
    FROM achievements
    ORDER BY requirement_type, requirement_value, key
    "#,
    )?;

    let rows = stmt
        .query_map([], row_to_achievement)?
        .collect::<Result<Vec<_>>>()?;

    let skipped = rows.iter().filter(|a| a.is_none()).count();
    if skipped > 0 {
        tracing::warn!("Skipped {} achievements with unknown requirement type", skipped);
    }
    Ok(rows.into_iter().flatten().collect())
}

fn row_to_achievement(row: &rusqlite::Row) -> Result<Option<Achievement>> {
    let requirement: String = row.get(6)?;
    let Some(requirement_type) = RequirementType::from_str(&requirement) else {
        return Ok(None);
    };
    Ok(Some(Achievement {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        xp_reward: row.get(5)?,
        requirement_type,
        requirement_value: row.get(7)?,
    }))
}

/// Keys of achievements this user has unlocked
pub fn list_unlocked_keys(conn: &Connection, user_id: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT a.key
    FROM user_achievements ua
    JOIN achievements a ON a.id = ua.achievement_id
    WHERE ua.user_id = ?1
    "#,
    )?;
    let keys = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<HashSet<String>>>()?;
    Ok(keys)
}

/// Record an unlock. Returns false when the user already had it.
pub fn insert_unlock_record(conn: &Connection, user_id: &str, achievement_id: &str) -> Result<bool> {
    let inserted = conn.execute(
        r#"
    INSERT OR IGNORE INTO user_achievements (id, user_id, achievement_id, unlocked_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
        params![Uuid::new_v4().to_string(), user_id, achievement_id, Utc::now().to_rfc3339()],
    )?;
    Ok(inserted > 0)
}

/// Remove an unlock whose XP award did not go through
pub fn delete_unlock_record(conn: &Connection, user_id: &str, achievement_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2",
        params![user_id, achievement_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_seed_is_idempotent() {
        let env = TestEnv::new().unwrap();
        let before = list_achievements(&env.conn).unwrap().len();
        assert_eq!(before, DEFAULT_ACHIEVEMENTS.len());
        seed_achievements(&env.conn).unwrap();
        assert_eq!(list_achievements(&env.conn).unwrap().len(), before);
    }

    #[test]
    fn test_unlock_record_written_once() {
        let env = TestEnv::new().unwrap();
        let user = env.create_user("a@example.com");
        let catalog = list_achievements(&env.conn).unwrap();
        let first = catalog.iter().find(|a| a.key == "first_question").unwrap();

        assert!(insert_unlock_record(&env.conn, &user, &first.id).unwrap());
        assert!(!insert_unlock_record(&env.conn, &user, &first.id).unwrap());

        let keys = list_unlocked_keys(&env.conn, &user).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("first_question"));

        delete_unlock_record(&env.conn, &user, &first.id).unwrap();
        assert!(list_unlocked_keys(&env.conn, &user).unwrap().is_empty());
        assert!(insert_unlock_record(&env.conn, &user, &first.id).unwrap());
    }

    #[test]
    fn test_unknown_requirement_rows_are_skipped() {
        let env = TestEnv::new().unwrap();
        env.conn
            .execute(
                "INSERT INTO achievements (id, key, name, description, icon, xp_reward, requirement_type, requirement_value)
                 VALUES ('x', 'mystery', 'Mystery', '?', 'help', 5, 'minutes_studied', 10)",
                [],
            )
            .unwrap();
        let catalog = list_achievements(&env.conn).unwrap();
        assert!(catalog.iter().all(|a| a.key != "mystery"));
    }
}

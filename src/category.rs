//! Defines the category model and database queries.
//!
//! Category management (create/rename/delete from the UI) is an external
//! collaborator; this module only holds what the statistics rollups and the
//! limit reports need to resolve names and parent chains.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::Error;

/// The ID of a category in the database.
pub type CategoryId = i64;

/// A spending or income category, optionally nested under a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// The parent category, for rollups. `None` marks a top-level category.
    pub parent_id: Option<CategoryId>,
}

/// Create a new category in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_category(
    name: &str,
    parent_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = connection
        .prepare(
            "INSERT INTO category (name, parent_id) VALUES (?1, ?2)
             RETURNING id, name, parent_id",
        )?
        .query_one((name, parent_id), map_category_row)?;

    Ok(category)
}

/// Retrieve all categories.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, parent_id FROM category ORDER BY id")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent_id INTEGER,
                FOREIGN KEY(parent_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::{create_category, list_categories};

    #[test]
    fn create_and_list_categories() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let food = create_category("Food", None, &conn).unwrap();
        let eating_out = create_category("Eating out", Some(food.id), &conn).unwrap();

        let categories = list_categories(&conn).unwrap();

        assert_eq!(categories, vec![food.clone(), eating_out.clone()]);
        assert_eq!(eating_out.parent_id, Some(food.id));
    }
}

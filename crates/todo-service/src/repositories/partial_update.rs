//! Builder for PATCH statements.
//!
//! Only supplied fields end up in the SET clause. The clause always starts by
//! assigning the row's primary key to itself, so a PATCH with nothing supplied
//! is still a valid statement that matches (and returns) the current row under
//! the same ownership predicate as a full update.

use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// An `UPDATE {table} SET {pk} = $1[, col = $n ...]` under construction.
pub struct PartialUpdate<'args> {
    builder: QueryBuilder<'args, Postgres>,
    supplied: usize,
}

impl<'args> PartialUpdate<'args> {
    /// Start an update of `table` whose row is identified by `pk = id`.
    ///
    /// `table` and `pk` are trusted identifiers from code, never user input.
    pub fn new(table: &'static str, pk: &'static str, id: i64) -> Self {
        let mut builder = QueryBuilder::new(format!("UPDATE {table} SET {pk} = "));
        builder.push_bind(id);
        Self {
            builder,
            supplied: 0,
        }
    }

    /// Add `column = value` if the value was supplied.
    pub fn set<T>(mut self, column: &'static str, value: Option<T>) -> Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(", ").push(column).push(" = ");
            self.builder.push_bind(value);
            self.supplied += 1;
        }
        self
    }

    /// Number of supplied fields.
    pub fn supplied(&self) -> usize {
        self.supplied
    }

    /// Hand over the builder so the caller can append FROM/WHERE/RETURNING.
    pub fn into_builder(self) -> QueryBuilder<'args, Postgres> {
        self.builder
    }
}

// ABOUTME: Parameterized SQL statement builders shared by sync and ping
// ABOUTME: Uses ? placeholders and backtick quoting, valid for MySQL and SQLite

/// Quote an identifier with backticks, escaping any embedded backtick.
///
/// Backticks are MySQL's identifier quoting; SQLite accepts them as well, so
/// one form serves both drivers.
pub fn quote_ident(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push('`');
    for ch in identifier.chars() {
        if ch == '`' {
            quoted.push('`');
        }
        quoted.push(ch);
    }
    quoted.push('`');
    quoted
}

fn quoted_list(identifiers: &[String]) -> String {
    identifiers
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a SELECT of exactly the given columns.
///
/// `order_by` lists the primary-key columns in declared order; ordering by
/// them makes the checksum input deterministic. `limit` is used by ping to
/// fetch a single probe row.
pub fn build_select(
    table: &str,
    columns: &[String],
    order_by: &[String],
    limit: Option<u64>,
) -> String {
    let mut query = format!("SELECT {} FROM {}", quoted_list(columns), quote_ident(table));

    if !order_by.is_empty() {
        query.push_str(&format!(" ORDER BY {}", quoted_list(order_by)));
    }

    if let Some(limit) = limit {
        query.push_str(&format!(" LIMIT {}", limit));
    }

    query
}

/// Build a full-row INSERT in column order.
///
/// Generates a statement like:
/// ```sql
/// INSERT INTO `users` (`id`, `name`, `age`) VALUES (?, ?, ?)
/// ```
pub fn build_insert(table: &str, columns: &[String]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        quoted_list(columns),
        placeholders
    )
}

/// Build an UPDATE that sets every non-key column, keyed by equality over all
/// key columns in order.
///
/// Generates a statement like:
/// ```sql
/// UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ?
/// ```
pub fn build_update(table: &str, set_columns: &[String], key_columns: &[String]) -> String {
    let assignments = set_columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(table),
        assignments,
        where_equality(key_columns)
    )
}

/// Build a DELETE keyed by equality over all key columns in order.
pub fn build_delete(table: &str, key_columns: &[String]) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        quote_ident(table),
        where_equality(key_columns)
    )
}

fn where_equality(key_columns: &[String]) -> String {
    key_columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("users"), "`users`");
        assert_eq!(quote_ident("weird`name"), "`weird``name`");
    }

    #[test]
    fn test_build_select_ordered() {
        let query = build_select("users", &cols(&["id", "name", "age"]), &cols(&["id"]), None);
        assert_eq!(
            query,
            "SELECT `id`, `name`, `age` FROM `users` ORDER BY `id`"
        );
    }

    #[test]
    fn test_build_select_composite_order_and_limit() {
        let query = build_select(
            "users",
            &cols(&["name", "age"]),
            &cols(&["age", "name"]),
            Some(1),
        );
        assert_eq!(
            query,
            "SELECT `name`, `age` FROM `users` ORDER BY `age`, `name` LIMIT 1"
        );
    }

    #[test]
    fn test_build_insert() {
        let query = build_insert("users", &cols(&["id", "name", "age"]));
        assert_eq!(
            query,
            "INSERT INTO `users` (`id`, `name`, `age`) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_build_update_single_key() {
        let query = build_update("users", &cols(&["name", "age"]), &cols(&["id"]));
        assert_eq!(
            query,
            "UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ?"
        );
    }

    #[test]
    fn test_build_update_composite_key() {
        let query = build_update("users", &cols(&["favoriteColor"]), &cols(&["age", "name"]));
        assert_eq!(
            query,
            "UPDATE `users` SET `favoriteColor` = ? WHERE `age` = ? AND `name` = ?"
        );
    }

    #[test]
    fn test_build_delete_composite_key() {
        let query = build_delete("order_items", &cols(&["order_id", "item_id"]));
        assert_eq!(
            query,
            "DELETE FROM `order_items` WHERE `order_id` = ? AND `item_id` = ?"
        );
    }
}

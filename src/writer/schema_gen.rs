use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = if col.key {
            " PRIMARY KEY AUTOINCREMENT"
        } else {
            ""
        };
        columns.push(format!("    {} {}{}", col.name, col.col_type.sql_type(), pk));
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for explicit indexes and foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let explicit = schema.indexes.iter().map(|idx| {
        let unique = if idx.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX idx_{}_{} ON {}({})",
            unique,
            schema.name,
            idx.columns.join("_"),
            schema.name,
            idx.columns.join(", ")
        )
    });

    let foreign = schema.foreign_keys.iter().map(|fk| {
        format!(
            "CREATE INDEX idx_{}_{} ON {}({})",
            schema.name, fk.column, schema.name, fk.column
        )
    });

    explicit.chain(foreign).collect()
}

pub fn generate_drop_table(schema: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {}", schema.name)
}

/// INSERT for every non-key column, in schema order
pub fn generate_insert(schema: &TableSchema) -> String {
    let columns: Vec<&str> = schema.insert_columns().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

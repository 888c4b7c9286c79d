use std::collections::HashMap;

use schemaward_core::{Column, FkAction, ForeignKey, Index, IndexKind, KeyRole, PRIMARY_INDEX, Table};

use super::queries::{RawColumn, RawForeignKey, RawIndexRow, RawReferentialRule, RawTable};

pub fn map_tables(raw: Vec<RawTable>) -> Vec<Table> {
    raw.into_iter()
        .map(|table| Table {
            name: table.name,
            column_count: table.column_count,
            row_count: 0,
            locked: false,
            protected: false,
        })
        .collect()
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<Column> {
    raw.into_iter()
        .map(|col| Column {
            nullable: col.is_nullable.eq_ignore_ascii_case("YES"),
            key: KeyRole::from_catalog(&col.column_key),
            name: col.name,
            column_type: col.column_type,
            default: col.default,
            extra: col.extra,
        })
        .collect()
}

/// Classify an index from its name, uniqueness and index-type marker.
pub fn classify_index(name: &str, non_unique: bool, index_type: &str) -> IndexKind {
    if name.eq_ignore_ascii_case(PRIMARY_INDEX) {
        return IndexKind::Primary;
    }
    match index_type.trim().to_ascii_uppercase().as_str() {
        "FULLTEXT" => IndexKind::Fulltext,
        "SPATIAL" => IndexKind::Spatial,
        _ if !non_unique => IndexKind::Unique,
        _ => IndexKind::Index,
    }
}

/// Collapse one-row-per-member output into one entry per index.
///
/// Indexes keep first-seen order; members are ordered by their sequence.
pub fn map_indexes(raw: Vec<RawIndexRow>) -> Vec<Index> {
    let mut grouped: Vec<(Index, Vec<(u64, String)>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in raw {
        let slot = match positions.get(&row.name) {
            Some(slot) => *slot,
            None => {
                let kind = classify_index(&row.name, row.non_unique, &row.index_type);
                positions.insert(row.name.clone(), grouped.len());
                grouped.push((
                    Index {
                        name: row.name.clone(),
                        kind,
                        columns: Vec::new(),
                    },
                    Vec::new(),
                ));
                grouped.len() - 1
            }
        };
        grouped[slot].1.push((row.sequence, row.column));
    }

    grouped
        .into_iter()
        .map(|(mut index, mut members)| {
            members.sort_by_key(|(sequence, _)| *sequence);
            index.columns = members.into_iter().map(|(_, column)| column).collect();
            index
        })
        .collect()
}

/// Join key-usage rows with their referential rules by constraint name.
///
/// A constraint without a rule row gets `RESTRICT` for both actions.
pub fn map_foreign_keys(keys: Vec<RawForeignKey>, rules: Vec<RawReferentialRule>) -> Vec<ForeignKey> {
    let rules: HashMap<String, RawReferentialRule> = rules
        .into_iter()
        .map(|rule| (rule.name.clone(), rule))
        .collect();

    keys.into_iter()
        .map(|key| {
            let (on_delete, on_update) = match rules.get(&key.name) {
                Some(rule) => (
                    FkAction::from_catalog(&rule.delete_rule),
                    FkAction::from_catalog(&rule.update_rule),
                ),
                None => (FkAction::Restrict, FkAction::Restrict),
            };
            ForeignKey {
                name: key.name,
                column: key.column,
                referenced_table: key.referenced_table,
                referenced_column: key.referenced_column,
                on_delete,
                on_update,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_row(name: &str, non_unique: bool, column: &str, sequence: u64, index_type: &str) -> RawIndexRow {
        RawIndexRow {
            name: name.to_string(),
            non_unique,
            column: column.to_string(),
            sequence,
            index_type: index_type.to_string(),
        }
    }

    #[test]
    fn groups_multi_column_unique_index_in_ordinal_order() {
        let indexes = map_indexes(vec![
            index_row("PRIMARY", false, "id", 1, "BTREE"),
            index_row("uniq_name", false, "last_name", 2, "BTREE"),
            index_row("uniq_name", false, "first_name", 1, "BTREE"),
        ]);

        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].kind, IndexKind::Primary);
        assert_eq!(indexes[1].name, "uniq_name");
        assert_eq!(indexes[1].kind, IndexKind::Unique);
        assert_eq!(indexes[1].columns, vec!["first_name", "last_name"]);
    }

    #[test]
    fn classifies_special_index_types() {
        assert_eq!(classify_index("ft_body", true, "FULLTEXT"), IndexKind::Fulltext);
        assert_eq!(classify_index("sp_geo", true, "SPATIAL"), IndexKind::Spatial);
        assert_eq!(classify_index("idx_a", true, "BTREE"), IndexKind::Index);
        assert_eq!(classify_index("primary", false, "BTREE"), IndexKind::Primary);
    }

    #[test]
    fn foreign_keys_default_to_restrict_without_rules() {
        let keys = vec![
            RawForeignKey {
                name: "fk_orders_user_id".to_string(),
                column: "user_id".to_string(),
                referenced_table: "users".to_string(),
                referenced_column: "id".to_string(),
            },
            RawForeignKey {
                name: "fk_orders_product_id".to_string(),
                column: "product_id".to_string(),
                referenced_table: "products".to_string(),
                referenced_column: "id".to_string(),
            },
        ];
        let rules = vec![RawReferentialRule {
            name: "fk_orders_user_id".to_string(),
            update_rule: "NO ACTION".to_string(),
            delete_rule: "CASCADE".to_string(),
        }];

        let fks = map_foreign_keys(keys, rules);
        assert_eq!(fks[0].on_delete, FkAction::Cascade);
        assert_eq!(fks[0].on_update, FkAction::NoAction);
        assert_eq!(fks[1].on_delete, FkAction::Restrict);
        assert_eq!(fks[1].on_update, FkAction::Restrict);
    }

    #[test]
    fn columns_map_nullability_and_key_role() {
        let columns = map_columns(vec![RawColumn {
            name: "id".to_string(),
            column_type: "int(11)".to_string(),
            is_nullable: "NO".to_string(),
            default: None,
            extra: "auto_increment".to_string(),
            column_key: "PRI".to_string(),
        }]);
        assert!(!columns[0].nullable);
        assert_eq!(columns[0].key, KeyRole::Primary);
    }
}

// sentri-core/src/domain/dataset/filter.rs

// Row predicates for `filter_condition`.
// The expression is checked with sqlparser, then DuckDB evaluates it as the
// WHERE clause of a scan over the dataset's Arrow batch. A row is kept only
// when the predicate is TRUE.

use duckdb::Connection;
use duckdb::vtab::arrow::{ArrowVTab, arrow_recordbatch_to_query_params};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use super::Dataset;
use crate::domain::error::CheckEvaluationError;

/// A parsed `filter_condition`, bound to the columns of one dataset.
#[derive(Debug, Clone)]
pub struct RowFilter {
    source: String,
    predicate: String,
}

impl RowFilter {
    /// Parses `source` as a single SQL expression.
    ///
    /// A double-quoted word that names no column of `dataset` is read as a
    /// string literal, so `status == "open"` compares against text.
    pub fn compile(source: &str, dataset: &Dataset) -> Result<Self, CheckEvaluationError> {
        let invalid = |reason: String| CheckEvaluationError::InvalidFilter {
            filter: source.to_string(),
            reason,
        };

        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, source)
            .tokenize()
            .map_err(|e| invalid(e.to_string()))?;
        let columns = dataset.column_names();
        let tokens: Vec<Token> = tokens
            .into_iter()
            .map(|token| match token {
                Token::Word(w)
                    if w.quote_style == Some('"')
                        && !columns.iter().any(|c| c.eq_ignore_ascii_case(&w.value)) =>
                {
                    Token::SingleQuotedString(w.value)
                }
                other => other,
            })
            .collect();

        let mut parser = Parser::new(&dialect).with_tokens(tokens);
        let expr = parser.parse_expr().map_err(|e| invalid(e.to_string()))?;
        if parser.peek_token().token != Token::EOF {
            return Err(invalid(format!(
                "unexpected trailing input near '{}'",
                parser.peek_token().token
            )));
        }

        Ok(Self {
            source: source.to_string(),
            predicate: expr.to_string(),
        })
    }

    /// Keeps the rows for which the predicate holds. Unknown columns and type
    /// errors surface here, as DuckDB binds the expression.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, CheckEvaluationError> {
        let invalid = |reason: String| CheckEvaluationError::InvalidFilter {
            filter: self.source.clone(),
            reason,
        };

        let conn = Connection::open_in_memory().map_err(|e| invalid(e.to_string()))?;
        conn.register_table_function::<ArrowVTab>("arrow")
            .map_err(|e| invalid(e.to_string()))?;

        let sql = format!("SELECT * FROM arrow(?, ?) WHERE {}", self.predicate);
        let mut stmt = conn.prepare(&sql).map_err(|e| invalid(e.to_string()))?;
        let params = arrow_recordbatch_to_query_params(dataset.batch().clone());
        let arrow = stmt.query_arrow(params).map_err(|e| invalid(e.to_string()))?;
        let schema = arrow.get_schema();
        let batches: Vec<_> = arrow.collect();

        Dataset::from_batches(schema, &batches).map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::dataset::Value;
    use anyhow::Result;

    fn dataset() -> Result<Dataset> {
        Ok(Dataset::from_rows(
            vec!["region".into(), "amount".into(), "day".into()],
            vec![
                vec!["US".into(), 10.into(), "2024-01-01".into()],
                vec!["EU".into(), Value::Null, "2024-01-02".into()],
                vec!["US".into(), (-4).into(), "2024-01-03".into()],
                vec!["APAC".into(), 25.5.into(), "2024-01-03".into()],
            ],
        )?)
    }

    fn kept(source: &str) -> Result<usize> {
        let ds = dataset()?;
        Ok(RowFilter::compile(source, &ds)?.apply(&ds)?.num_rows())
    }

    #[test]
    fn test_comparison_and_boolean_logic() -> Result<()> {
        assert_eq!(kept("region = 'US'")?, 2);
        assert_eq!(kept("region == 'US' and amount > 0")?, 1);
        assert_eq!(kept("amount > 0 OR region = 'EU'")?, 3);
        assert_eq!(kept("NOT region = 'US'")?, 2);
        Ok(())
    }

    #[test]
    fn test_null_comparisons_drop_rows() -> Result<()> {
        assert_eq!(kept("amount <> 10")?, 2);
        assert_eq!(kept("amount IS NULL")?, 1);
        assert_eq!(kept("amount IS NOT NULL")?, 3);
        Ok(())
    }

    #[test]
    fn test_in_between_like_and_dates() -> Result<()> {
        assert_eq!(kept("region IN ('US', 'APAC')")?, 3);
        assert_eq!(kept("amount BETWEEN 0 AND 20")?, 1);
        assert_eq!(kept("region LIKE 'A%'")?, 1);
        assert_eq!(kept("day >= '2024-01-02'")?, 3);
        assert_eq!(kept("amount * 2 > 40")?, 1);
        Ok(())
    }

    #[test]
    fn test_double_quoted_text_literal() -> Result<()> {
        assert_eq!(kept("region == \"EU\"")?, 1);
        assert_eq!(kept("\"region\" = 'EU'")?, 1);
        Ok(())
    }

    #[test]
    fn test_filtered_rows_keep_columns_and_values() -> Result<()> {
        let ds = dataset()?;
        let out = RowFilter::compile("region = 'US'", &ds)?.apply(&ds)?;
        assert_eq!(out.column_names(), ["region", "amount", "day"]);
        assert_eq!(
            out.column("amount"),
            Some(vec![Value::Float(10.0), Value::Float(-4.0)])
        );
        Ok(())
    }

    #[test]
    fn test_extreme_integers_do_not_abort() -> Result<()> {
        let ds = Dataset::from_rows(
            vec!["n".into()],
            vec![vec![Value::Int(i64::MIN)], vec![Value::Int(3)]],
        )?;
        let res = RowFilter::compile("-n > 0", &ds)?.apply(&ds);
        match res {
            Ok(out) => assert!(out.num_rows() <= 1),
            Err(err) => assert_eq!(err.error_type(), "InvalidFilter"),
        }
        Ok(())
    }

    #[test]
    fn test_invalid_filters_carry_source() -> Result<()> {
        let ds = dataset()?;
        for bad in ["amount >", "amount > 1 amount", "1; DROP TABLE t"] {
            let err = RowFilter::compile(bad, &ds).unwrap_err();
            match err {
                CheckEvaluationError::InvalidFilter { filter, .. } => assert_eq!(filter, bad),
                other => panic!("unexpected error {other:?}"),
            }
        }
        let err = RowFilter::compile("ghost = 1", &ds)?.apply(&ds).unwrap_err();
        assert!(matches!(err, CheckEvaluationError::InvalidFilter { ref filter, .. } if filter == "ghost = 1"));
        Ok(())
    }
}

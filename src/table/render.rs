use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Cell, HeaderCell, RenderError, Row, SortAction, Table};
use crate::page::Page;

pub type Extractor = Arc<dyn Fn(&Value) -> Result<Cell, RenderError> + Send + Sync>;

/// A labelled column: how to turn one record into one cell.
#[derive(Clone)]
pub struct Column {
    pub label: String,
    extractor: Extractor,
}

impl Column {
    pub fn new<F>(label: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&Value) -> Result<Cell, RenderError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            extractor: Arc::new(extractor),
        }
    }

    pub fn extract(&self, record: &Value) -> Result<Cell, RenderError> {
        (self.extractor)(record)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("label", &self.label).finish()
    }
}

/// Ordered columns; position in the plan is the column index used for sorting.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    columns: Vec<Column>,
}

impl RenderPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column<F>(mut self, label: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&Value) -> Result<Cell, RenderError> + Send + Sync + 'static,
    {
        self.columns.push(Column::new(label, extractor));
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds a detached table named `table_id`; records keep their order.
    pub fn build_table(&self, table_id: &str, records: &[Value]) -> Result<Table, RenderError> {
        let headers = self
            .columns
            .iter()
            .enumerate()
            .map(|(column, c)| HeaderCell {
                label: c.label.clone(),
                on_click: SortAction {
                    table_id: table_id.to_string(),
                    column,
                },
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                let cells = self
                    .columns
                    .iter()
                    .map(|c| c.extract(record))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Row { cells })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        Ok(Table {
            id: table_id.to_string(),
            headers,
            rows,
            sort: None,
        })
    }
}

/// Replaces whatever `container_id` holds with a table built from `records`.
/// The container is cleared first, so on error it is left empty.
pub fn render_table(
    page: &mut Page,
    container_id: &str,
    records: &[Value],
    plan: &RenderPlan,
) -> Result<(), RenderError> {
    page.clear(container_id);
    let table = plan.build_table(container_id, records)?;
    tracing::debug!(
        container = container_id,
        rows = table.rows.len(),
        columns = table.column_count(),
        "rendered table"
    );
    page.set_table(container_id, table);
    Ok(())
}

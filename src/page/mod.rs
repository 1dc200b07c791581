use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::table::{SortDirection, Table};

/// What a named container currently shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContainerContent {
    Empty,
    Loading,
    Table { table: Table },
    Failure { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Container {
    pub id: String,
    pub title: String,
    pub content: ContainerContent,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("no table rendered in container '{0}'")]
    NoTable(String),

    #[error(transparent)]
    Render(#[from] crate::table::RenderError),
}

/// The in-memory document: named containers in insertion order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Page {
    order: Vec<String>,
    containers: BTreeMap<String, Container>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a container with a heading; existing content is kept.
    pub fn add_container(&mut self, id: &str, title: &str) {
        let container = self.entry(id);
        container.title = title.to_string();
    }

    fn entry(&mut self, id: &str) -> &mut Container {
        if !self.containers.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.containers
            .entry(id.to_string())
            .or_insert_with(|| Container {
                id: id.to_string(),
                title: id.to_string(),
                content: ContainerContent::Empty,
            })
    }

    pub fn clear(&mut self, id: &str) {
        self.entry(id).content = ContainerContent::Empty;
    }

    pub fn set_loading(&mut self, id: &str) {
        self.entry(id).content = ContainerContent::Loading;
    }

    pub fn set_table(&mut self, id: &str, table: Table) {
        self.entry(id).content = ContainerContent::Table { table };
    }

    pub fn set_failure(&mut self, id: &str, message: impl Into<String>) {
        self.entry(id).content = ContainerContent::Failure {
            message: message.into(),
        };
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.order.iter().filter_map(|id| self.containers.get(id))
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        match self.containers.get(id).map(|c| &c.content) {
            Some(ContainerContent::Table { table }) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        match self.containers.get_mut(id).map(|c| &mut c.content) {
            Some(ContainerContent::Table { table }) => Some(table),
            _ => None,
        }
    }

    /// Header click on `column` of the table in `table_id`.
    pub fn sort_table(&mut self, table_id: &str, column: usize) -> Result<SortDirection, PageError> {
        let table = self
            .table_mut(table_id)
            .ok_or_else(|| PageError::NoTable(table_id.to_string()))?;
        Ok(table.click_header(column)?)
    }
}

//! OpenEdge query arguments.

use crate::openedge::database::OpenEdgeArgumentValue;
use crate::openedge::types::TypeContext;
use crate::openedge::{OpenEdge, OpenEdgeError};
use sqlx_core::arguments::Arguments;
use sqlx_core::encode::{Encode, IsNull};
use sqlx_core::error::BoxDynError;
use sqlx_core::types::Type;
use std::fmt::{self, Write};

/// Positional (`?`) arguments for an OpenEdge query.
#[derive(Debug, Default, Clone)]
pub struct OpenEdgeArguments<'q> {
    pub(crate) values: Vec<OpenEdgeArgumentValue<'q>>,
}

impl<'q> OpenEdgeArguments<'q> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a bind argument. `None` and other null encodings bind SQL `NULL`.
    pub fn add<T>(&mut self, value: T) -> Result<(), BoxDynError>
    where
        T: 'q + Encode<'q, OpenEdge> + Type<OpenEdge>,
    {
        let before = self.values.len();
        match value.encode(&mut self.values) {
            Ok(IsNull::Yes) => {
                self.values.truncate(before);
                self.values.push(OpenEdgeArgumentValue::Null);
            }
            Ok(IsNull::No) => {}
            Err(error) => {
                self.values.truncate(before);
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn values(&self) -> &[OpenEdgeArgumentValue<'q>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render every argument to its bound text form.
    pub fn to_params(&self, ctx: &TypeContext) -> Result<Vec<Option<String>>, OpenEdgeError> {
        self.values.iter().map(|value| value.to_param(ctx)).collect()
    }
}

impl<'q> Arguments<'q> for OpenEdgeArguments<'q> {
    type Database = OpenEdge;

    fn reserve(&mut self, additional: usize, _size_hint: usize) {
        self.values.reserve(additional);
    }

    fn add<T>(&mut self, value: T) -> Result<(), BoxDynError>
    where
        T: 'q + Encode<'q, Self::Database> + Type<Self::Database>,
    {
        OpenEdgeArguments::add(self, value)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn format_placeholder<W: Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_char('?')
    }
}

impl<'q> sqlx_core::arguments::IntoArguments<'q, OpenEdge> for OpenEdgeArguments<'q> {
    fn into_arguments(self) -> OpenEdgeArguments<'q> {
        self
    }
}

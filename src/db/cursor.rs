//! Streaming row cursor shared by the sqlx-backed sources.
//!
//! Wraps an sqlx row stream with a one-row lookahead. The first row is pulled
//! when the cursor is opened so that a rejected statement fails at execute
//! time rather than on the first `advance`.

use futures::stream::BoxStream;
use futures::TryStreamExt;

pub(crate) struct RowStream<'a, R> {
    stream: Option<BoxStream<'a, Result<R, sqlx::Error>>>,
    pending: Option<R>,
    current: Option<R>,
}

impl<'a, R: Send> RowStream<'a, R> {
    /// Opens the cursor by polling the stream for its first row.
    pub(crate) async fn open(
        mut stream: BoxStream<'a, Result<R, sqlx::Error>>,
    ) -> Result<Self, sqlx::Error> {
        let first = stream.try_next().await?;

        // An exhausted stream has already handed its connection back.
        let stream = if first.is_some() { Some(stream) } else { None };

        Ok(Self {
            stream,
            pending: first,
            current: None,
        })
    }

    /// Returns the first row while it has not been consumed yet.
    pub(crate) fn peek(&self) -> Option<&R> {
        self.pending.as_ref()
    }

    /// Returns the row most recently reached by [`RowStream::advance`].
    pub(crate) fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Moves to the next row.
    pub(crate) async fn advance(&mut self) -> Result<bool, sqlx::Error> {
        if let Some(row) = self.pending.take() {
            self.current = Some(row);
            return Ok(true);
        }

        self.current = None;
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };

        match stream.try_next().await {
            Ok(Some(row)) => {
                self.current = Some(row);
                Ok(true)
            }
            Ok(None) => {
                self.stream = None;
                Ok(false)
            }
            Err(e) => {
                self.stream = None;
                Err(e)
            }
        }
    }
}

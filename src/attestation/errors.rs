// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Semantic error: {0}")]
    Sema(String),
    #[error("Unexpected end of input: {0}")]
    UnexpectedEnd(String),
    #[error("Unknown element: {0}")]
    UnknownElement(String),
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Duplicated element: {0}")]
    DuplicatedElement(String),
    #[error("Element type mismatch: {0}")]
    TypeMismatch(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Syntax(e)
            | Error::Sema(e)
            | Error::UnexpectedEnd(e)
            | Error::UnknownElement(e)
            | Error::MissingElement(e)
            | Error::DuplicatedElement(e)
            | Error::TypeMismatch(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Whether this error only forwards a failure that was already reported.
    pub fn is_already_reported(&self) -> bool {
        matches!(self.internal_error, ErrorImpl::AlreadyReported)
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::SymbolAlreadyDeclared { .. } => "SymbolAlreadyDeclared",
            ErrorImpl::SymbolNotDeclared { .. } => "SymbolNotDeclared",
            ErrorImpl::NotAnExpression { .. } => "NotAnExpression",
            ErrorImpl::OperatorTypeMismatch { .. } => "OperatorTypeMismatch",
            ErrorImpl::RankMismatch { .. } => "RankMismatch",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArgument { .. } => "MissingArgument",
            ErrorImpl::UnknownKeyword { .. } => "UnknownKeyword",
            ErrorImpl::DuplicateArgument { .. } => "DuplicateArgument",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::NoMatchingSpecific { .. } => "NoMatchingSpecific",
            ErrorImpl::AmbiguousGenericCall { .. } => "AmbiguousGenericCall",
            ErrorImpl::NoMatchingFunction { .. } => "NoMatchingFunction",
            ErrorImpl::AmbiguousCall { .. } => "AmbiguousCall",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::StructureConstructorError { .. } => "StructureConstructorError",
            ErrorImpl::SubscriptCountMismatch { .. } => "SubscriptCountMismatch",
            ErrorImpl::InvalidSubscript { .. } => "InvalidSubscript",
            ErrorImpl::NoSuchMember { .. } => "NoSuchMember",
            ErrorImpl::NotAssignable { .. } => "NotAssignable",
            ErrorImpl::AssignmentTypeMismatch { .. } => "AssignmentTypeMismatch",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::InvalidKind { .. } => "InvalidKind",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::NotConstant { .. } => "NotConstant",
            ErrorImpl::NotSupported { .. } => "NotSupported",
            ErrorImpl::AlreadyReported => "AlreadyReported",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::SymbolAlreadyDeclared { name } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", name))
            }
            ErrorImpl::SymbolNotDeclared { name } => {
                ErrorTip::Suggestion(format!("`{}` has not been declared", name))
            }
            ErrorImpl::NotAnExpression { name } => {
                ErrorTip::Suggestion(format!("`{}` does not name a value", name))
            }
            ErrorImpl::OperatorTypeMismatch { operator, operands } => ErrorTip::Suggestion(format!(
                "Invalid operand types {} for operator `{}`",
                operands, operator
            )),
            ErrorImpl::RankMismatch { operator, left, right } => ErrorTip::Suggestion(format!(
                "Operands of `{}` have ranks {} and {} which do not conform",
                operator, left, right
            )),
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at most {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArgument { procedure, parameter } => ErrorTip::Suggestion(format!(
                "No argument given for `{}` of `{}`",
                parameter, procedure
            )),
            ErrorImpl::UnknownKeyword { procedure, keyword } => ErrorTip::Suggestion(format!(
                "`{}` has no dummy argument named `{}`",
                procedure, keyword
            )),
            ErrorImpl::DuplicateArgument { procedure, parameter } => ErrorTip::Suggestion(format!(
                "Argument `{}` of `{}` given more than once",
                parameter, procedure
            )),
            ErrorImpl::ArgumentTypeMatchError {
                parameter,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Argument `{}` expects `{}`, received `{}`",
                parameter, expected, received
            )),
            ErrorImpl::NoMatchingSpecific { generic, arguments } => ErrorTip::Suggestion(format!(
                "No specific interface of `{}` matches ({})",
                generic, arguments
            )),
            ErrorImpl::AmbiguousGenericCall { generic, candidates } => ErrorTip::Suggestion(format!(
                "Call to `{}` matches several specific interfaces: {}",
                generic, candidates
            )),
            ErrorImpl::NoMatchingFunction { function, arguments } => ErrorTip::Suggestion(format!(
                "No function `{}` can be called with ({})",
                function, arguments
            )),
            ErrorImpl::AmbiguousCall { function, candidates } => ErrorTip::Suggestion(format!(
                "Call to `{}` is ambiguous between {}",
                function, candidates
            )),
            ErrorImpl::NotCallable { name } => {
                ErrorTip::Suggestion(format!("`{}` cannot be called", name))
            }
            ErrorImpl::StructureConstructorError { type_, message } => {
                ErrorTip::Suggestion(format!("Constructor of `{}`: {}", type_, message))
            }
            ErrorImpl::SubscriptCountMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} subscripts, received {}",
                expected, received
            )),
            ErrorImpl::InvalidSubscript { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::NoSuchMember { type_, member } => {
                ErrorTip::Suggestion(format!("`{}` has no member `{}`", type_, member))
            }
            ErrorImpl::NotAssignable { expression } => {
                ErrorTip::Suggestion(format!("`{}` cannot be assigned to", expression))
            }
            ErrorImpl::AssignmentTypeMismatch { left, right } => ErrorTip::Suggestion(format!(
                "Cannot assign `{}` to `{}`",
                right, left
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidKind { kind } => {
                ErrorTip::Suggestion(format!("Kind {} is not supported here", kind))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::NotConstant { name } => {
                ErrorTip::Suggestion(format!("Initializer of `{}` is not a constant expression", name))
            }
            ErrorImpl::NotSupported { feature } => {
                ErrorTip::Suggestion(format!("Sorry, {} is not supported yet", feature))
            }
            ErrorImpl::AlreadyReported => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("{name:?} already declared")]
    SymbolAlreadyDeclared { name: String },
    #[error("{name:?} not declared")]
    SymbolNotDeclared { name: String },
    #[error("{name:?} is not an expression")]
    NotAnExpression { name: String },
    #[error("invalid operands {operands} to {operator:?}")]
    OperatorTypeMismatch { operator: String, operands: String },
    #[error("rank mismatch in {operator:?}: {left} and {right}")]
    RankMismatch {
        operator: String,
        left: usize,
        right: usize,
    },
    #[error("too many arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing argument {parameter:?} in call to {procedure:?}")]
    MissingArgument { procedure: String, parameter: String },
    #[error("unknown keyword {keyword:?} in call to {procedure:?}")]
    UnknownKeyword { procedure: String, keyword: String },
    #[error("argument {parameter:?} of {procedure:?} specified twice")]
    DuplicateArgument { procedure: String, parameter: String },
    #[error("argument types do not match for {parameter:?}: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError {
        parameter: String,
        expected: String,
        received: String,
    },
    #[error("no specific interface of {generic:?} matches ({arguments})")]
    NoMatchingSpecific { generic: String, arguments: String },
    #[error("ambiguous call to generic {generic:?}: {candidates}")]
    AmbiguousGenericCall { generic: String, candidates: String },
    #[error("no matching function for call to {function:?} with ({arguments})")]
    NoMatchingFunction { function: String, arguments: String },
    #[error("ambiguous call to {function:?}: {candidates}")]
    AmbiguousCall { function: String, candidates: String },
    #[error("{name:?} is not callable")]
    NotCallable { name: String },
    #[error("invalid structure constructor for {type_:?}: {message}")]
    StructureConstructorError { type_: String, message: String },
    #[error("wrong number of subscripts: expected {expected:?}, received {received:?}")]
    SubscriptCountMismatch { expected: usize, received: usize },
    #[error("invalid subscript: {message}")]
    InvalidSubscript { message: String },
    #[error("{type_:?} has no member {member:?}")]
    NoSuchMember { type_: String, member: String },
    #[error("{expression:?} is not assignable")]
    NotAssignable { expression: String },
    #[error("cannot assign {right:?} to {left:?}")]
    AssignmentTypeMismatch { left: String, right: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("invalid kind {kind}")]
    InvalidKind { kind: i64 },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("initializer of {name:?} is not constant")]
    NotConstant { name: String },
    #[error("sorry, {feature} is not supported")]
    NotSupported { feature: String },
    #[error("error already reported")]
    AlreadyReported,
}

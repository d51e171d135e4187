use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Body is not a straight-line let chain of the expected shape.
    #[snafu(display("malformed ANF: {reason}"))]
    MalformedAnf { reason: String },

    /// Structurally valid input that a pass refuses to rewrite.
    #[snafu(display("unsupported pattern: {reason}"))]
    UnsupportedPattern { reason: String },

    #[snafu(display("undefined symbol '@{name}'"))]
    UndefinedSymbol { name: String },

    #[snafu(display("variable {var} is already bound in this scope"))]
    DuplicateBinding { var: String },

    #[snafu(display("'@{name}' is an external declaration, not a function"))]
    NotAFunction { name: String },

    #[snafu(display("ill-formed function: {reason}"))]
    IllFormed { reason: String },

    #[snafu(display("pass '{pass}' failed: {source}"))]
    PassFailed {
        pass: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    #[snafu(display("pass '{name}' is already registered"))]
    DuplicatePass { name: String },

    #[snafu(display("no pass named '{name}' is registered"))]
    UnknownPass { name: String },
}

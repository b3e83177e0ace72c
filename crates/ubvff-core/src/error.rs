pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("read failed ({what})")]
    Truncated { what: &'static str },

    #[error("layer name overflow: {len} characters (max {max})")]
    LayerNameTooLong { len: u32, max: usize },

    #[error("unexpected point count for cubics: {count} (not a multiple of 3)")]
    CubicPointCount { count: u32 },

    #[error("unexpected point count ({what}): 0")]
    EmptyPointList { what: &'static str },

    #[error("not a valid command file (header check failed)")]
    InvalidHeader,

    #[error("not a valid command file (footer check failed)")]
    InvalidFooter,

    #[error("{opcode} has parameter that isn't {expected}: {value}")]
    UnexpectedParameter {
        opcode: &'static str,
        expected: u16,
        value: u16,
    },

    #[error("unknown END_PATH parameter: {value}")]
    UnknownEndPathKind { value: u16 },

    #[error("weird header: include file with second word {value}")]
    WeirdHeader { value: i32 },

    #[error("{what} name is too long ({len} bytes, max {max})")]
    NameTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unable to create auto name for {path}")]
    NoAutoName { path: String },
}

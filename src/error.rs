use std::fmt;

#[derive(Debug)]
pub enum Error {
    WrongDevice(String),
    FontNotFound(String),
    Parse { line: usize, message: String },
    State { line: usize, message: String },
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn state(line: usize, message: impl Into<String>) -> Self {
        Error::State {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WrongDevice(device) => {
                write!(f, "input was formatted for device '{}', not 'pdf'", device)
            }
            Error::FontNotFound(name) => {
                write!(f, "no font description found for '{}'", name)
            }
            Error::Parse { line, message } => write!(f, "line {}: {}", line, message),
            Error::State { line, message } => write!(f, "line {}: {}", line, message),
            Error::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

use crate::error::Error;

/// One classified input line. Payload slices borrow from the line
/// buffer; glyph payloads stay raw bytes end to end.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Device(DeviceCtl),
    BeginPage,
    SelectFont(u32),
    SetSize(u32),
    Text(&'a [u8]),
    /// `c`: a single glyph, typeset exactly like a one-byte `t`.
    TypesetChar(&'a [u8]),
    /// `N`: a glyph named by numeric character code.
    TypesetCode(u32),
    SpecialGlyph(&'a [u8]),
    Draw,
    MoveRelH(u32),
    MoveRelV,
    MoveAbsH(u32),
    MoveAbsV(u32),
    /// `w` prefix: the remainder is re-dispatched by the interpreter.
    WordGap(&'a [u8]),
    Newline,
    Color,
    Comment,
    Blank,
    Unknown(u8),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeviceCtl {
    Init,
    Resolution(u32),
    Typesetter(String),
    MountFont { pos: u32, short: String },
    PaperSize { x: u32, y: u32 },
    Filename,
    Trailer,
    Stop,
    Other(String),
}

/// Unsigned decimal with surrounding whitespace and an optional trailing
/// device tag `z` stripped.
fn parse_scaled(bytes: &[u8], line_no: usize) -> Result<u32, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::parse(line_no, "non-ascii numeric argument"))?;
    let text = text.trim();
    let text = text.strip_suffix('z').unwrap_or(text);
    text.parse()
        .map_err(|_| Error::parse(line_no, format!("bad numeric argument '{}'", text)))
}

pub fn parse_line(line: &[u8], line_no: usize) -> Result<Command<'_>, Error> {
    let Some(&letter) = line.first() else {
        return Ok(Command::Blank);
    };
    let rest = &line[1..];
    match letter {
        b'+' => Ok(Command::Comment),
        b'x' => parse_device(rest, line_no).map(Command::Device),
        b'p' => Ok(Command::BeginPage),
        b'f' => Ok(Command::SelectFont(parse_scaled(rest, line_no)?)),
        b's' => Ok(Command::SetSize(parse_scaled(rest, line_no)?)),
        b't' => Ok(Command::Text(rest)),
        b'c' => Ok(Command::TypesetChar(rest)),
        b'N' => Ok(Command::TypesetCode(parse_scaled(rest, line_no)?)),
        b'C' => Ok(Command::SpecialGlyph(rest)),
        b'D' => Ok(Command::Draw),
        b'h' => Ok(Command::MoveRelH(parse_scaled(rest, line_no)?)),
        b'v' => Ok(Command::MoveRelV),
        b'H' => Ok(Command::MoveAbsH(parse_scaled(rest, line_no)?)),
        b'V' => Ok(Command::MoveAbsV(parse_scaled(rest, line_no)?)),
        b'w' => Ok(Command::WordGap(rest)),
        b'n' => Ok(Command::Newline),
        b'm' => Ok(Command::Color),
        other => Ok(Command::Unknown(other)),
    }
}

/// `x` control lines. Sub-command words may be abbreviated to their
/// first letter, so both `x init` and `x i` are accepted.
fn parse_device(rest: &[u8], line_no: usize) -> Result<DeviceCtl, Error> {
    let text = std::str::from_utf8(rest)
        .map_err(|_| Error::parse(line_no, "non-ascii device control line"))?;
    let mut words = text.split_whitespace();
    let Some(word) = words.next() else {
        return Err(Error::parse(line_no, "empty device control line"));
    };
    match word.chars().next() {
        Some('i') => Ok(DeviceCtl::Init),
        Some('r') => {
            let Some(res) = words.next() else {
                return Err(Error::parse(line_no, "x res missing resolution"));
            };
            let res = res.strip_suffix('z').unwrap_or(res);
            let res = res
                .parse()
                .map_err(|_| Error::parse(line_no, format!("bad resolution '{}'", res)))?;
            Ok(DeviceCtl::Resolution(res))
        }
        Some('T') => {
            let Some(name) = words.next() else {
                return Err(Error::parse(line_no, "x T missing device name"));
            };
            Ok(DeviceCtl::Typesetter(name.to_string()))
        }
        Some('f') => {
            let pos = words
                .next()
                .ok_or_else(|| Error::parse(line_no, "x font missing position"))?;
            let pos = pos
                .parse()
                .map_err(|_| Error::parse(line_no, format!("bad font position '{}'", pos)))?;
            let Some(short) = words.next() else {
                return Err(Error::parse(line_no, "x font missing font name"));
            };
            Ok(DeviceCtl::MountFont {
                pos,
                short: short.to_string(),
            })
        }
        Some('X') => {
            let Some(payload) = words.next() else {
                return Err(Error::parse(line_no, "x X missing payload"));
            };
            if let Some(value) = payload.strip_prefix("papersize=") {
                let mut parts = value.split(',');
                let x = parts
                    .next()
                    .ok_or_else(|| Error::parse(line_no, "papersize missing width"))?;
                let y = parts
                    .next()
                    .ok_or_else(|| Error::parse(line_no, "papersize missing height"))?;
                let x = parse_scaled(x.as_bytes(), line_no)?;
                let y = parse_scaled(y.as_bytes(), line_no)?;
                Ok(DeviceCtl::PaperSize { x, y })
            } else {
                Ok(DeviceCtl::Other(format!("X {}", payload)))
            }
        }
        Some('F') => Ok(DeviceCtl::Filename),
        Some('t') => Ok(DeviceCtl::Trailer),
        Some('s') => Ok(DeviceCtl::Stop),
        _ => Ok(DeviceCtl::Other(word.to_string())),
    }
}

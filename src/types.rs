use std::fmt;

/// Decimal fixed-point value: a whole part and the first three decimal
/// digits. All cursor and page arithmetic runs on this type so that the
/// rendered operands are identical across platforms and runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dec {
    integer: u32,
    // Always < 1000.
    fraction: u32,
}

impl Dec {
    pub const ZERO: Dec = Dec {
        integer: 0,
        fraction: 0,
    };

    pub fn new(integer: u32, fraction: u32) -> Dec {
        debug_assert!(fraction < 1000);
        Dec { integer, fraction }
    }

    /// Truncating construction from the rational `n / d`. The fraction
    /// digits come from scaling the remainder by 10 three times, so the
    /// result never rounds up. `d == 0` is a caller error.
    pub fn from_ratio(n: u32, d: u32) -> Dec {
        debug_assert!(d != 0);
        let integer = n / d;
        let mut rem = (n % d) as u64;
        let d = d as u64;
        let mut fraction = 0u32;
        for _ in 0..3 {
            rem *= 10;
            fraction = fraction * 10 + (rem / d) as u32;
            rem %= d;
        }
        Dec { integer, fraction }
    }

    pub fn integer(self) -> u32 {
        self.integer
    }

    pub fn fraction(self) -> u32 {
        self.fraction
    }

    /// `whole - self`, borrowing from the whole part when the fraction is
    /// non-zero. Callers guard `whole >= self.integer`.
    pub fn sub_from(self, whole: u32) -> Dec {
        if self.fraction == 0 {
            Dec {
                integer: whole - self.integer,
                fraction: 0,
            }
        } else {
            Dec {
                integer: whole - self.integer - 1,
                fraction: 1000 - self.fraction,
            }
        }
    }
}

impl std::ops::Add for Dec {
    type Output = Dec;
    fn add(self, rhs: Dec) -> Dec {
        let mut integer = self.integer + rhs.integer;
        let mut fraction = self.fraction + rhs.fraction;
        if fraction >= 1000 {
            integer += fraction / 1000;
            fraction %= 1000;
        }
        Dec { integer, fraction }
    }
}

impl std::ops::AddAssign for Dec {
    fn add_assign(&mut self, rhs: Dec) {
        *self = *self + rhs;
    }
}

impl std::ops::Mul for Dec {
    type Output = Dec;
    fn mul(self, rhs: Dec) -> Dec {
        // Milli-unit product kept in the source's original shape for
        // output compatibility.
        let milli = (self.integer as u64) * (rhs.fraction as u64)
            + (self.fraction as u64) * (rhs.fraction as u64) / 1000;
        let integer = (self.integer as u64) * (rhs.integer as u64) + milli / 1000;
        Dec {
            integer: integer as u32,
            fraction: (milli % 1000) as u32,
        }
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.integer, self.fraction)
    }
}

/// Renders without trailing fraction zeros (`612`, `595.28`). Used for
/// MediaBox entries; content-stream operands keep the full three digits.
pub fn fmt_trim(value: Dec) -> String {
    if value.fraction == 0 {
        return value.integer.to_string();
    }
    let mut s = format!("{}.{:03}", value.integer, value.fraction);
    while s.ends_with('0') {
        s.pop();
    }
    s
}

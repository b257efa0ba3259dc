//! Access permission bits
//!
//! ```text
//! bit  15..12    11..8     7..4     3..0
//!      reserved  other     group    owner
//!                [x d w r] [x d w r][x d w r]   (x = reserved)
//! ```

use std::fmt;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessPermission: u16 {
        const OWNER_READ = 1 << 0;
        const OWNER_WRITE = 1 << 1;
        const OWNER_DELETE = 1 << 2;
        const OWNER_RESERVED = 1 << 3;

        const GROUP_READ = 1 << 4;
        const GROUP_WRITE = 1 << 5;
        const GROUP_DELETE = 1 << 6;
        const GROUP_RESERVED = 1 << 7;

        const OTHER_READ = 1 << 8;
        const OTHER_WRITE = 1 << 9;
        const OTHER_DELETE = 1 << 10;
        const OTHER_RESERVED = 1 << 11;

        const RESERVED0 = 1 << 12;
        const RESERVED1 = 1 << 13;
        const RESERVED2 = 1 << 14;
        const RESERVED3 = 1 << 15;
    }
}

impl fmt::Display for AccessPermission {
    /// `rwdr--r--` style; reserved bits are not shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let triples = [
            (Self::OWNER_READ, Self::OWNER_WRITE, Self::OWNER_DELETE),
            (Self::GROUP_READ, Self::GROUP_WRITE, Self::GROUP_DELETE),
            (Self::OTHER_READ, Self::OTHER_WRITE, Self::OTHER_DELETE),
        ];

        for (read, write, delete) in triples {
            f.write_str(if self.contains(read) { "r" } else { "-" })?;
            f.write_str(if self.contains(write) { "w" } else { "-" })?;
            f.write_str(if self.contains(delete) { "d" } else { "-" })?;
        }
        Ok(())
    }
}

//! Block modes as a capability set
//!
//! `READ_WRITE` is the union of `READ` and `WRITE`, so a single
//! `contains` check gates every operation.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Capabilities a block was opened with (or a stream supports)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockMode: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl BlockMode {
    pub fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.can_read(), self.can_write()) {
            (true, true) => "ReadWrite",
            (true, false) => "Read",
            (false, true) => "Write",
            (false, false) => "None",
        };
        f.write_str(name)
    }
}

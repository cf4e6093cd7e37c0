//! Mnemonics of the commands understood by the SMS60

macro_rules! makepl {
    ($($name:ident, $val:literal),*) => {
        $(pub const $name: &str = $val;)*
    };
}

// prefixing a mnemonic with QUERY turns it into a read, e.g. "?CNT"
#[rustfmt::skip]
makepl!(
    QUERY, "?",
    RESET, "RST",
    TERMINAL_MODE, "TERM",
    FIRMWARE_VERSION, "VD",
    REFERENCE, "REF",
    STATUS, "ST",
    POSITIONING_MODE, "MOD",
    TARGET, "SET",
    GO, "GO",
    COUNTER, "CNT",
    VELOCITY, "VEL"
);

// tokens of the status reply which together mean complete standstill
pub const NO_MOTION: &str = "MOTION=0";
pub const NO_REFERENCING: &str = "REF=0";

// parameter of REF selecting the reference run used by the stage
pub const REFERENCE_MODE: &str = "2";

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of every report exchanged with the host, in both directions.
/// This is the maximum packet size of a full speed interrupt endpoint,
/// so a report always fits in a single transaction.
pub const REPORT_SIZE: usize = 64;

// Vendor defined usage page, so the OS doesn't bind any driver to the
// interface and the host application can open it directly. A single
// unnumbered 64 byte report each way.
pub const GENERIC_REPORT_DESCRIPTOR: [u8; 34] = [
    0x06, 0x00, 0xff,                                       // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01,                                             // Usage (1)
    0xa1, 0x01,                                             // Collection (Application)
    0x09, 0x02,                                             //  Usage (2)
    0x15, 0x00,                                             //  Logical Minimum (0)
    0x26, 0xff, 0x00,                                       //  Logical Maximum (255)
    0x75, 0x08,                                             //  Report Size (8)
    0x95, REPORT_SIZE as u8,                                //  Report Count (64)
    0x81, 0x02,                                             //  Input (Data,Var,Abs)
    0x09, 0x03,                                             //  Usage (3)
    0x15, 0x00,                                             //  Logical Minimum (0)
    0x26, 0xff, 0x00,                                       //  Logical Maximum (255)
    0x75, 0x08,                                             //  Report Size (8)
    0x95, REPORT_SIZE as u8,                                //  Report Count (64)
    0x91, 0x02,                                             //  Output (Data,Var,Abs)
    0xc0,                                                   // End Collection
];

/// A raw report, as sent or received through the HID interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct Report([u8; REPORT_SIZE]);

impl Report {
    pub const fn zeroed() -> Self {
        Report([0; REPORT_SIZE])
    }

    pub const fn from_array(bytes: [u8; REPORT_SIZE]) -> Self {
        Report(bytes)
    }

    /// Builds a report with the given bytes at its start, padded with
    /// zeros. Bytes past [`REPORT_SIZE`] are discarded.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut report = Self::zeroed();
        let len = bytes.len().min(REPORT_SIZE);
        report.0[..len].copy_from_slice(&bytes[..len]);
        report
    }

    pub fn bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.0
    }

    pub fn bytes_mut(&mut self) -> &mut [u8; REPORT_SIZE] {
        &mut self.0
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Response to a status request. Each LED is reported as 1 when lit
/// and 0 otherwise.
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StatusReport {
    pub leds: [u8; 4],
    pub volume: u8,
    _reserved: [u8; REPORT_SIZE - 5],
}

const _: () = assert!(size_of::<StatusReport>() == REPORT_SIZE, "Status report must fill exactly one report");

impl StatusReport {
    pub fn new(leds: [bool; 4], volume: u8) -> Self {
        Self {
            leds: leds.map(u8::from),
            volume,
            _reserved: [0; REPORT_SIZE - 5],
        }
    }
}

impl From<StatusReport> for Report {
    fn from(value: StatusReport) -> Self {
        zerocopy::transmute!(value)
    }
}

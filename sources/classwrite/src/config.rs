use std::fmt;

/// A class file format version, `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassVersion {
    pub major: u16,
    pub minor: u16,
}

impl ClassVersion {
    pub const V1_1: ClassVersion = ClassVersion::new(45, 3);
    pub const V1_2: ClassVersion = ClassVersion::new(46, 0);
    pub const V1_3: ClassVersion = ClassVersion::new(47, 0);
    pub const V1_4: ClassVersion = ClassVersion::new(48, 0);
    pub const V1_5: ClassVersion = ClassVersion::new(49, 0);
    pub const V1_6: ClassVersion = ClassVersion::new(50, 0);
    pub const V1_7: ClassVersion = ClassVersion::new(51, 0);
    pub const V1_8: ClassVersion = ClassVersion::new(52, 0);
    pub const V11: ClassVersion = ClassVersion::new(55, 0);
    pub const V17: ClassVersion = ClassVersion::new(61, 0);
    pub const V21: ClassVersion = ClassVersion::new(65, 0);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Versions before Java 5 have no ACC_SYNTHETIC bit, synthetic members
    /// must carry a Synthetic attribute instead.
    pub fn is_pre_modern(&self) -> bool {
        self.major < Self::V1_5.major
    }
}

impl Default for ClassVersion {
    fn default() -> Self {
        Self::V1_8
    }
}

impl fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterConfig {
    pub version: ClassVersion,

    /// Signal synthetic fields with a Synthetic attribute regardless of the
    /// target version.
    pub legacy_synthetic: bool,
}

impl WriterConfig {
    pub fn new(version: ClassVersion) -> Self {
        Self {
            version,
            legacy_synthetic: false,
        }
    }

    pub fn with_legacy_synthetic(mut self, legacy_synthetic: bool) -> Self {
        self.legacy_synthetic = legacy_synthetic;
        self
    }
}

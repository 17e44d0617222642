use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DatasetError;

/// Number of writer partitions (`hsf_0` .. `hsf_7`) under each class folder.
pub const WRITER_PARTITIONS: usize = 8;

/// Which block of SD19 classes to load.
///
/// Each variant covers a contiguous range of Unicode code points; a class
/// folder is named after its code point in lowercase hex (`0x41` -> `41`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Digits,
    CapLetters,
    LowLetters,
}

struct ClassRange {
    start: u32,
    len: u32,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::Digits, DataType::CapLetters, DataType::LowLetters];

    const fn range(self) -> ClassRange {
        match self {
            DataType::Digits => ClassRange { start: 0x30, len: 10 },
            DataType::CapLetters => ClassRange { start: 0x41, len: 26 },
            DataType::LowLetters => ClassRange { start: 0x61, len: 26 },
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DataType::Digits => "digits",
            DataType::CapLetters => "cap_letters",
            DataType::LowLetters => "low_letters",
        }
    }

    /// First code point of the range.
    pub fn start(self) -> u32 {
        self.range().start
    }

    pub fn num_classes(self) -> usize {
        self.range().len as usize
    }

    /// Class labels in scan order.
    pub fn labels(self) -> impl Iterator<Item = char> {
        let ClassRange { start, len } = self.range();
        (start..start + len).filter_map(char::from_u32)
    }

    pub fn contains(self, label: char) -> bool {
        let ClassRange { start, len } = self.range();
        (start..start + len).contains(&(label as u32))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DataType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|data_type| data_type.key() == s)
            .ok_or_else(|| {
                let keys: Vec<&str> = DataType::ALL.iter().map(|d| d.key()).collect();
                DatasetError::Config(format!(
                    "Argument 'data_type' should be one of: {:?}, got '{}'",
                    keys, s
                ))
            })
    }
}

/// Folder name of a class: its code point in lowercase hex, no prefix.
pub fn class_folder_name(label: char) -> String {
    format!("{:x}", label as u32)
}

/// Folder name of writer partition `index`.
pub fn partition_folder_name(index: usize) -> String {
    format!("hsf_{}", index)
}

/// Folder holding the test partition of a class.
pub fn test_folder_name(label: char) -> String {
    format!("train_{}", class_folder_name(label))
}

/// Maximum number of samples collected per class.
///
/// With `per_class` the limit applies to each class as given; otherwise it
/// is split evenly across the classes, rounding down.
pub fn per_class_cap(size_limit: usize, per_class: bool, data_type: DataType) -> usize {
    if per_class {
        size_limit
    } else {
        size_limit / data_type.num_classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_ranges() {
        let digits: String = DataType::Digits.labels().collect();
        assert_eq!(digits, "0123456789");
        assert_eq!(DataType::CapLetters.labels().count(), 26);
        assert_eq!(DataType::CapLetters.labels().next(), Some('A'));
        assert_eq!(DataType::LowLetters.labels().last(), Some('z'));
        assert!(DataType::LowLetters.contains('q'));
        assert!(!DataType::LowLetters.contains('Q'));
    }

    #[test]
    fn test_folder_names() {
        assert_eq!(class_folder_name('0'), "30");
        assert_eq!(class_folder_name('Z'), "5a");
        assert_eq!(class_folder_name('z'), "7a");
        assert_eq!(partition_folder_name(7), "hsf_7");
        assert_eq!(test_folder_name('a'), "train_61");
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!("digits".parse::<DataType>().unwrap(), DataType::Digits);
        assert_eq!("cap_letters".parse::<DataType>().unwrap(), DataType::CapLetters);
        assert_eq!("low_letters".parse::<DataType>().unwrap(), DataType::LowLetters);

        let err = "symbols".parse::<DataType>().unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
        assert!(err.to_string().contains("low_letters"));
        assert!("Digits".parse::<DataType>().is_err());
    }

    #[test]
    fn test_per_class_cap() {
        assert_eq!(per_class_cap(1000, true, DataType::Digits), 1000);
        assert_eq!(per_class_cap(1000, false, DataType::Digits), 100);
        assert_eq!(per_class_cap(1000, false, DataType::CapLetters), 38);
        assert_eq!(per_class_cap(5, false, DataType::LowLetters), 0);
    }
}

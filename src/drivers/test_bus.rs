//! Scripted I2C bus for unit tests.
//!
//! Every `transaction` is recorded segment by segment. Read segments are
//! filled from a queue of canned responses; a transaction can be told to
//! fail instead.

use std::collections::VecDeque;

use embedded_hal::i2c::{Error, ErrorKind, ErrorType, I2c, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Default)]
pub struct FakeBus {
    pub address: Option<u8>,
    pub reads: VecDeque<Vec<u8>>,
    pub fail_on: Option<usize>,
    pub log: Vec<Vec<Segment>>,
}

impl FakeBus {
    pub fn queue(&mut self, data: &[u8]) -> &mut Self {
        self.reads.push_back(data.to_vec());
        self
    }
}

impl ErrorType for FakeBus {
    type Error = BusFault;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.address = Some(address);
        let index = self.log.len();
        let fail = self.fail_on == Some(index);
        let mut segments = Vec::new();

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => segments.push(Segment::Write(bytes.to_vec())),
                Operation::Read(buf) => {
                    segments.push(Segment::Read(buf.len()));
                    if !fail {
                        let data = self.reads.pop_front().expect("no canned read left");
                        assert_eq!(data.len(), buf.len(), "canned read has wrong length");
                        buf.copy_from_slice(&data);
                    }
                }
            }
        }

        self.log.push(segments);
        if fail {
            Err(BusFault)
        } else {
            Ok(())
        }
    }
}

use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};

/// A line-oriented device shell that can be written to and polled for output
pub trait Console: Read + Write {
    /// Drop anything received but not yet read
    fn clear_input(&mut self) -> io::Result<()>;

    /// Number of bytes that can be read without waiting
    fn bytes_available(&mut self) -> io::Result<usize>;
}

/// A [Console] on a serial port
pub struct SerialConsole {
    port: Box<dyn SerialPort>,
}

impl SerialConsole {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialConsole {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Console for SerialConsole {
    fn clear_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read().map_err(io::Error::from)? as usize)
    }
}

use std::cell::Cell;

//===========================================================================//

/// The four byte-wide ports through which the main CPU and the coprocessor
/// talk to each other.  Each side writes into the other side's inbox and
/// reads from its own.
#[derive(Debug, Default)]
pub struct ApuPorts {
    to_spc: [Cell<u8>; 4],
    to_cpu: [Cell<u8>; 4],
}

impl ApuPorts {
    /// Returns the byte the coprocessor last wrote to `port`.
    pub fn cpu_read(&self, port: usize) -> u8 {
        self.to_cpu[port & 3].get()
    }

    /// Sends a byte from the main CPU to the coprocessor.
    pub fn cpu_write(&self, port: usize, value: u8) {
        self.to_spc[port & 3].set(value);
    }

    /// Returns the byte the main CPU last wrote to `port`.
    pub fn spc_read(&self, port: usize) -> u8 {
        self.to_spc[port & 3].get()
    }

    /// Sends a byte from the coprocessor to the main CPU.
    pub fn spc_write(&self, port: usize, value: u8) {
        self.to_cpu[port & 3].set(value);
    }

    /// Zeroes the coprocessor's inbox for the given ports.
    pub fn clear_spc_inputs(&self, ports: std::ops::Range<usize>) {
        for port in ports {
            self.to_spc[port & 3].set(0);
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::ApuPorts;

    #[test]
    fn ports_are_directional() {
        let ports = ApuPorts::default();
        ports.cpu_write(0, 0xaa);
        ports.spc_write(0, 0xbb);
        assert_eq!(ports.spc_read(0), 0xaa);
        assert_eq!(ports.cpu_read(0), 0xbb);
        ports.clear_spc_inputs(0..2);
        assert_eq!(ports.spc_read(0), 0x00);
        assert_eq!(ports.cpu_read(0), 0xbb);
    }
}

//===========================================================================//

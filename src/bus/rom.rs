use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use std::io::{self, Read};

//===========================================================================//

const COPIER_HEADER_SIZE: usize = 0x200;
const LOROM_HEADER_START: usize = 0x7fc0;
const TITLE_LEN: usize = 21;
const COMPLEMENT_OFFSET: usize = 0x7fdc;
const CHECKSUM_OFFSET: usize = 0x7fde;
const RESET_VECTOR_OFFSET: usize = 0x7ffc;

//===========================================================================//

/// A LoROM cartridge image.
pub struct RomImage {
    data: Vec<u8>,
}

impl RomImage {
    /// Wraps raw image bytes, dropping a 512-byte copier header if present.
    pub fn from_bytes(mut data: Vec<u8>) -> RomImage {
        if data.len() % 0x400 == COPIER_HEADER_SIZE {
            debug!("stripping {COPIER_HEADER_SIZE}-byte copier header");
            data.drain(..COPIER_HEADER_SIZE);
        }
        RomImage { data }
    }

    /// Reads a whole image from `reader`.
    pub fn read_from<R: Read>(mut reader: R) -> io::Result<RomImage> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(RomImage::from_bytes(data))
    }

    /// Returns the image contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the game title from the internal header, if the image is large
    /// enough to have one.
    pub fn title(&self) -> Option<String> {
        let bytes =
            self.data.get(LOROM_HEADER_START..LOROM_HEADER_START + TITLE_LEN)?;
        let title: String = bytes
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
            .collect();
        Some(title.trim_end().to_string())
    }

    /// Returns true if the header's checksum and its complement agree.
    pub fn checksum_matches_complement(&self) -> bool {
        let complement = self.header_u16(COMPLEMENT_OFFSET);
        let checksum = self.header_u16(CHECKSUM_OFFSET);
        match (complement, checksum) {
            (Some(complement), Some(checksum)) => {
                complement ^ checksum == 0xffff
            }
            _ => false,
        }
    }

    /// Returns the emulation-mode reset vector.
    pub fn reset_vector(&self) -> Option<u16> {
        self.header_u16(RESET_VECTOR_OFFSET)
    }

    fn header_u16(&self, offset: usize) -> Option<u16> {
        self.data.get(offset..offset + 2).map(LittleEndian::read_u16)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::RomImage;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 0x8000];
        data[0x7fc0..0x7fc5].copy_from_slice(b"HELLO");
        data[0x7fdc..0x7fe0].copy_from_slice(&[0xcd, 0xab, 0x32, 0x54]);
        data[0x7ffc] = 0x00;
        data[0x7ffd] = 0x80;
        data
    }

    #[test]
    fn header_fields() {
        let rom = RomImage::from_bytes(image());
        assert_eq!(rom.title().as_deref(), Some("HELLO"));
        assert!(rom.checksum_matches_complement());
        assert_eq!(rom.reset_vector(), Some(0x8000));
    }

    #[test]
    fn strips_copier_header() {
        let mut data = vec![0xffu8; 0x200];
        data.extend(image());
        let rom = RomImage::from_bytes(data);
        assert_eq!(rom.data().len(), 0x8000);
        assert_eq!(rom.reset_vector(), Some(0x8000));
    }

    #[test]
    fn tiny_image_has_no_header() {
        let rom = RomImage::from_bytes(vec![0xea; 0x10]);
        assert_eq!(rom.title(), None);
        assert_eq!(rom.reset_vector(), None);
    }
}

//===========================================================================//

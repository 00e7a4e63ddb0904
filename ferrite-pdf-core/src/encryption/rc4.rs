//! Bare RC4 stream cipher used by the standard security handler.

pub(crate) struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Schedules `key` into a fresh cipher state.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty.
    pub(crate) fn new(key: &[u8]) -> Self {
        assert!(!key.is_empty(), "RC4 key must not be empty");
        let mut s = [0u8; 256];
        for (index, slot) in s.iter_mut().enumerate() {
            *slot = index as u8;
        }
        let mut j = 0u8;
        for index in 0..256 {
            j = j
                .wrapping_add(s[index])
                .wrapping_add(key[index % key.len()]);
            s.swap(index, j as usize);
        }
        Rc4 { s, i: 0, j: 0 }
    }

    /// Applies the keystream to `input`, appending to `output`.
    /// Encryption and decryption are the same operation.
    pub(crate) fn process(&mut self, input: &[u8], output: &mut Vec<u8>) {
        output.reserve(input.len());
        for &byte in input {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.s[self.i as usize]);
            self.s.swap(self.i as usize, self.j as usize);
            let k = self.s
                [self.s[self.i as usize].wrapping_add(self.s[self.j as usize]) as usize];
            output.push(byte ^ k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc6229_keystream() {
        // RFC 6229, 40-bit key 0x0102030405
        let mut cipher = Rc4::new(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        let mut keystream = Vec::new();
        cipher.process(&[0u8; 16], &mut keystream);
        assert_eq!(
            keystream,
            [
                0xb2, 0x39, 0x63, 0x05, 0xf0, 0x3d, 0xc0, 0x27, 0xcc, 0xc3, 0x52, 0x4a, 0x0a,
                0x11, 0x18, 0xa8
            ]
        );
    }

    #[test]
    fn test_symmetric() {
        let key = b"a-demo-key";
        let plain = b"stream cipher roundtrip".as_slice();
        let mut encrypted = Vec::new();
        Rc4::new(key).process(plain, &mut encrypted);
        assert_ne!(encrypted, plain);
        let mut decrypted = Vec::new();
        Rc4::new(key).process(&encrypted, &mut decrypted);
        assert_eq!(decrypted, plain);
    }

    #[test]
    fn test_process_appends() {
        let mut cipher = Rc4::new(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        let mut out = vec![0xAA];
        cipher.process(&[0x00], &mut out);
        assert_eq!(out, [0xAA, 0xb2]);
    }

    #[test]
    #[should_panic(expected = "RC4 key must not be empty")]
    fn test_empty_key_panics() {
        let _ = Rc4::new(&[]);
    }
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Buffer size used when the trace can't be memory mapped
const BUFFER_SIZE: usize = 64 * 4096;

/// Wraps a trace file in the fastest line reader available for the platform
///
/// On unix the file is memory mapped and read sequentially. Empty files, and every file on other
/// systems, get a plain buffered reader.
pub fn get_reader(file: File) -> io::Result<Box<dyn BufRead>> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Mapping a zero length file fails on some systems
        if file.metadata()?.len() == 0 {
            return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)));
        }
        // Safety: the map is only read, traces aren't expected to change under a running simulation
        let map = unsafe { Mmap::map(&file)? };
        map.advise(Advice::Sequential)?;
        Ok(Box::new(Cursor::new(map)))
    }
}

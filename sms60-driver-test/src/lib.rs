#[cfg(test)]
mod tests;

use std::{
    cell::RefCell,
    collections::VecDeque,
    io::{self, Read, Write},
    rc::Rc,
};

type Responder = Box<dyn FnMut(&str) -> Option<String>>;

// used to mock the serial line of an SMS60 to test the driver
// everything written is recorded and can be inspected line by line afterwards.
// a read first drains the queued replies, one reply per read call. if there is
// nothing queued the responder (if any) is asked for a reply to the last line
// that was written. if nobody answers the read times out, just like the real
// port would.
//
// don't be alarmed if you think it's slow or inefficient or anything, it doesn't
// need to be fast nor pretty nor efficient, its just for testing. it needs to be
// easy
pub struct Interface {
    read: Rc<RefCell<VecDeque<Vec<u8>>>>,
    written: Rc<RefCell<Vec<u8>>>,
    responder: Rc<RefCell<Option<Responder>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl Read for Interface {
    fn read(&mut self, mut buf: &mut [u8]) -> io::Result<usize> {
        let queued = self.read.borrow_mut().pop_front();
        let reply = match queued {
            Some(r) => r,
            None => {
                let last = self.last_line().unwrap_or_default();
                let answer = self
                    .responder
                    .borrow_mut()
                    .as_mut()
                    .and_then(|respond| respond(last.as_str()));
                match answer {
                    Some(a) => a.into_bytes(),
                    None => return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply")),
                }
            }
        };
        if reply.len() > buf.len() {
            // put back what doesn't fit, the next read gets it
            self.read
                .borrow_mut()
                .push_front(reply[buf.len()..].to_vec());
            let n = buf.len();
            buf.write_all(&reply[..n])?;
            Ok(n)
        } else {
            buf.write_all(&reply)?;
            Ok(reply.len())
        }
    }
}

impl Write for Interface {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if *self.fail_writes.borrow() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Clone for Interface {
    fn clone(&self) -> Self {
        Interface {
            read: self.read.clone(),
            written: self.written.clone(),
            responder: self.responder.clone(),
            fail_writes: self.fail_writes.clone(),
        }
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface {
    pub fn new() -> Self {
        Interface {
            read: Rc::new(RefCell::new(VecDeque::new())),
            written: Rc::new(RefCell::new(Vec::new())),
            responder: Rc::new(RefCell::new(None)),
            fail_writes: Rc::new(RefCell::new(false)),
        }
    }

    /// Queues a reply, which is handed out by exactly one read
    pub fn add_read(&mut self, buf: &[u8]) {
        self.read.borrow_mut().push_back(buf.to_vec())
    }

    /// Sets the function answering reads once the queue is empty. It gets the
    /// last written line without its terminator.
    pub fn set_responder<F>(&mut self, f: F)
    where
        F: FnMut(&str) -> Option<String> + 'static,
    {
        *self.responder.borrow_mut() = Some(Box::new(f));
    }

    pub fn fail_writes(&mut self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    /// All written lines, split at '\r' and without the terminator
    pub fn lines(&self) -> Vec<String> {
        let written = self.written.borrow();
        String::from_utf8_lossy(&written)
            .split('\r')
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect()
    }

    // only looks at the end, the responder asks for this on every read
    pub fn last_line(&self) -> Option<String> {
        self.written
            .borrow()
            .rsplit(|&b| b == b'\r')
            .find(|l| !l.is_empty())
            .map(|l| String::from_utf8_lossy(l).into_owned())
    }

    /// Counts the written lines equal to `line`
    pub fn count(&self, line: &str) -> usize {
        self.lines().iter().filter(|l| *l == line).count()
    }

    /// Forgets everything written so far
    pub fn clear_written(&mut self) {
        self.written.borrow_mut().clear()
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.read.borrow().is_empty()
    }
}

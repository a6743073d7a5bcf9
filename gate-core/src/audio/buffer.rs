//! Lock-free sample transport between audio threads
//!
//! SPSC ring buffers connect the device callbacks to the processing
//! thread without blocking either side.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Sample ring buffer, split into writer and reader ends
pub struct SampleRing {
    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,
    capacity: usize,
}

impl SampleRing {
    /// Create a ring holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f64>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    pub fn split(self) -> (SampleWriter, SampleReader) {
        (
            SampleWriter {
                producer: self.producer,
                capacity: self.capacity,
            },
            SampleReader {
                consumer: self.consumer,
                capacity: self.capacity,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Writing end, owned by the producing thread
pub struct SampleWriter {
    producer: HeapProducer<f64>,
    capacity: usize,
}

impl SampleWriter {
    /// Write samples, returning how many fit
    pub fn write(&mut self, samples: &[f64]) -> usize {
        self.producer.push_slice(samples)
    }

    pub fn space(&self) -> usize {
        self.producer.free_len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Reading end, owned by the consuming thread
pub struct SampleReader {
    consumer: HeapConsumer<f64>,
    capacity: usize,
}

impl SampleReader {
    /// Read into `buffer`, returning how many samples were available
    pub fn read(&mut self, buffer: &mut [f64]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Number of samples waiting to be read
    pub fn available(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

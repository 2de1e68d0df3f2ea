use offheap_common::error::ErrorKind;

use crate::{
    BufferView, ByteBuffer, ByteOrder, CopyPolicy, DirectBuffer, HeapBuffer, MemoryConfig,
    MemoryUtil, Platform, ReadView, WriteView, view::direct::NativeRegion,
};

fn strict() -> MemoryUtil {
    MemoryUtil::new(MemoryConfig::new().with_platform(Platform::with_unaligned_access(false)))
}

fn relaxed() -> MemoryUtil {
    MemoryUtil::new(MemoryConfig::new().with_platform(Platform::with_unaligned_access(true)))
}

/// Native block freed on drop.
struct Block {
    address: u64,
}

impl Block {
    fn new(mem: &MemoryUtil, len: usize) -> Block {
        let address = mem.allocate(len);
        unsafe { mem.set_bytes_value(address, len, 0) };
        Block { address }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        unsafe { MemoryUtil::native().free(self.address) };
    }
}

#[test]
fn test_multi_byte_round_trip_all_offsets() {
    for mem in [strict(), relaxed()] {
        let block = Block::new(&mem, 64);
        let mut rng = fastrand::Rng::with_seed(42);
        for offset in 0..16u64 {
            let address = block.address + offset;
            let value = rng.i64(..);
            unsafe {
                mem.set_long(address, value);
                assert_eq!(mem.get_long(address), value, "offset {offset}");

                let value = rng.i32(..);
                mem.set_int(address, value);
                assert_eq!(mem.get_int(address), value, "offset {offset}");

                let value = rng.i16(..);
                mem.set_short(address, value);
                assert_eq!(mem.get_short(address), value, "offset {offset}");
                assert_eq!(mem.get_unsigned_short(address), value as u16);
            }
        }
    }
}

#[test]
fn test_fast_and_fallback_paths_agree() {
    let strict = strict();
    let relaxed = relaxed();
    let block = Block::new(&strict, 64);
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..500 {
        let address = block.address + rng.u64(0..56);
        let value = rng.i64(..);
        unsafe {
            strict.set_long(address, value);
            assert_eq!(relaxed.get_long(address), value);
            relaxed.set_long(address, value.rotate_left(13));
            assert_eq!(strict.get_long(address), value.rotate_left(13));

            let value = rng.i32(..);
            strict.set_int(address, value);
            assert_eq!(relaxed.get_int(address), value);
        }
    }
}

#[test]
fn test_unaligned_write_layout_is_native() {
    let mem = strict();
    let block = Block::new(&mem, 16);
    unsafe {
        mem.set_int(block.address + 1, 0x01020304);
        let mut bytes = [0u8; 4];
        mem.get_bytes_checked(block.address + 1, Some(&mut bytes[..]), 0, 4)
            .unwrap();
        assert_eq!(bytes, 0x01020304u32.to_ne_bytes());
    }
}

#[test]
fn test_set_direct_byte_buffer_resets_descriptor() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 256);
    let mut view = mem.get_hollow_direct_byte_buffer(ByteOrder::BigEndian);
    for length in [0usize, 1, 16, 255] {
        unsafe { mem.set_direct_byte_buffer(&mut view, block.address + 1, length) };
        assert_eq!(mem.get_address(&view), block.address + 1);
        assert_eq!(view.position(), 0);
        assert_eq!(view.limit(), length);
        assert_eq!(view.capacity(), length);
        assert_eq!(view.order(), ByteOrder::BigEndian);
        if length > 0 {
            view.set_position(length - 1).unwrap();
        }
    }
}

#[test]
fn test_rebinding_iterates_records() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 64);
    for i in 0..8u64 {
        unsafe { mem.set_long(block.address + i * 8, (i * 100) as i64) };
    }
    let mut view = mem.get_hollow_native_byte_buffer();
    let mut seen = Vec::new();
    for i in 0..8u64 {
        unsafe { mem.set_direct_byte_buffer(&mut view, block.address + i * 8, 8) };
        seen.push(view.get_u64(0).unwrap());
    }
    assert_eq!(seen, (0..8).map(|i| i * 100).collect::<Vec<u64>>());
}

#[test]
fn test_duplicate_direct_byte_buffer() {
    let mem = MemoryUtil::native();
    let mut source = DirectBuffer::allocate_direct(32);
    source.set_limit(24).unwrap();
    source.set_position(5).unwrap();

    let mut hollow = mem.get_hollow_native_byte_buffer();
    let dup = mem.duplicate_direct_byte_buffer(&source, &mut hollow);
    assert_eq!(dup.address(), source.address());
    assert_eq!(dup.position(), 5);
    assert_eq!(dup.limit(), 24);
    assert_eq!(dup.capacity(), 32);

    dup.set_position(10).unwrap();
    assert_eq!(source.position(), 5);

    let read_only = source.as_read_only();
    let mut hollow = mem.get_hollow_native_byte_buffer();
    let dup = mem.duplicate_direct_byte_buffer(&read_only, &mut hollow);
    assert_eq!(dup.address(), source.address());
    assert_eq!(dup.position(), 5);
}

#[test]
fn test_duplicate_into_hollow_outlives_source() {
    let mem = MemoryUtil::native();
    let mut source = DirectBuffer::allocate_direct(4096);
    source.put_u32(0, 0xC0FF_EE11).unwrap();

    let mut hollow = mem.get_hollow_native_byte_buffer();
    mem.duplicate_direct_byte_buffer(&source, &mut hollow);
    assert!(hollow.is_derived());
    drop(source);

    // a fresh allocation must not be able to reuse the block the view still aliases
    let mut other = DirectBuffer::allocate_direct(4096);
    other.put(0, 0x77).unwrap();
    assert_ne!(other.address(), hollow.address());
    assert_eq!(hollow.get_u32(0).unwrap(), 0xC0FF_EE11);

    let region = hollow
        .attachment()
        .and_then(|att| att.downcast_ref::<NativeRegion>())
        .map(|region| region.is_released());
    assert_eq!(region, Some(false));
    assert!(!unsafe { mem.clean(&mut hollow) });
}

#[test]
fn test_slice_into_hollow_outlives_source() {
    let mem = MemoryUtil::native();
    let mut source = DirectBuffer::allocate_direct(256);
    source.put_u64(128, 0x0102_0304_0506_0708).unwrap();
    let read_only = source.as_read_only();
    drop(source);

    let mut hollow = mem.get_hollow_native_byte_buffer();
    unsafe { mem.slice_direct_byte_buffer(&read_only, &mut hollow, 128, 8) };
    drop(read_only);

    assert!(hollow.is_derived());
    assert_eq!(hollow.get_u64(0).unwrap(), 0x0102_0304_0506_0708);
}

#[test]
fn test_slice_direct_byte_buffer() {
    let mem = MemoryUtil::native();
    let mut source = DirectBuffer::allocate_direct(64);
    for i in 0..64 {
        source.put(i, (i * 3) as u8).unwrap();
    }
    let mut hollow = mem.get_hollow_native_byte_buffer();
    let slice = unsafe { mem.slice_direct_byte_buffer(&source, &mut hollow, 10, 20) };
    assert_eq!(slice.address(), source.address() + 10);
    assert_eq!((slice.position(), slice.limit(), slice.capacity()), (0, 20, 20));

    let mut from_slice = [0u8; 20];
    let mut from_source = [0u8; 20];
    slice.get_bytes(0, &mut from_slice).unwrap();
    source.get_bytes(10, &mut from_source).unwrap();
    assert_eq!(from_slice, from_source);
}

#[test]
fn test_set_byte_buffer_capacity() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 128);
    let mut view = unsafe { mem.get_byte_buffer(block.address, 128) };
    view.set_position(3).unwrap();
    unsafe { mem.set_byte_buffer_capacity(&mut view, 40) };
    assert_eq!(view.address(), block.address);
    assert_eq!(view.position(), 3);
    assert_eq!(view.limit(), 128);
    assert_eq!(view.capacity(), 40);
}

#[test]
fn test_get_bytes_checked_errors() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 16);
    let mut buf = [0u8; 8];

    let condition = |res: offheap_common::Result<()>| match res.unwrap_err().into_kind() {
        ErrorKind::IndexOutOfBounds { condition, .. } => condition,
        other => panic!("unexpected kind: {other:?}"),
    };

    unsafe {
        let err = mem.get_bytes_checked(block.address, None, 0, 4).unwrap_err();
        assert!(err.is_null_buffer());
        assert_eq!(
            condition(mem.get_bytes_checked(block.address, Some(&mut buf[..]), -1, 4)),
            "offset < 0"
        );
        assert_eq!(
            condition(mem.get_bytes_checked(block.address, Some(&mut buf[..]), 0, -1)),
            "count < 0"
        );
        assert_eq!(
            condition(mem.get_bytes_checked(block.address, Some(&mut buf[..]), 4, 5)),
            "count > len - offset"
        );
    }
}

#[test]
fn test_get_bytes_checked_validation_order() {
    let mem = MemoryUtil::native();
    let mut buf = [0u8; 8];
    unsafe {
        // null is reported before anything else, even for zero-length requests
        assert!(mem.get_bytes_checked(0, None, -1, -1).unwrap_err().is_null_buffer());
        assert!(mem.get_bytes_checked(0, None, 0, 0).unwrap_err().is_null_buffer());
        // bounds are checked before the zero-length exit
        assert!(
            mem.get_bytes_checked(0, Some(&mut buf[..]), -1, 0)
                .unwrap_err()
                .is_out_of_bounds()
        );
        assert!(
            mem.get_bytes_checked(0, Some(&mut buf[..]), 9, 0)
                .unwrap_err()
                .is_out_of_bounds()
        );
        // a valid zero-length request never touches memory, address 0 included
        mem.get_bytes_checked(0, Some(&mut buf[..]), 8, 0).unwrap();
        mem.get_bytes_checked(0, Some(&mut buf[..]), 0, 0).unwrap();
        mem.get_bytes_checked(0, Some(&mut [][..]), 0, 0).unwrap();
    }
}

#[test]
fn test_get_bytes_checked_copies() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 16);
    let data = (1..=16u8).collect::<Vec<_>>();
    let mut buf = [0u8; 12];
    unsafe {
        mem.set_bytes(block.address, &data, 0, 16);
        mem.get_bytes_checked(block.address + 2, Some(&mut buf[..]), 4, 8)
            .unwrap();
    }
    assert_eq!(&buf[..4], &[0, 0, 0, 0]);
    assert_eq!(&buf[4..], &data[2..10]);
}

#[test]
fn test_clean_derived_does_not_release() {
    let mem = MemoryUtil::native();
    let mut owner = DirectBuffer::allocate_direct(64);
    owner.put_u64(8, 0x0123_4567_89AB_CDEF).unwrap();

    let mut dup = owner.duplicate();
    let mut slice = owner.slice(8, 8).unwrap();
    unsafe {
        assert!(!mem.clean(&mut dup));
        assert!(!mem.clean(&mut slice));
    }
    assert_eq!(owner.get_u64(8).unwrap(), 0x0123_4567_89AB_CDEF);
    assert_eq!(slice.get_u64(0).unwrap(), 0x0123_4567_89AB_CDEF);

    drop(dup);
    drop(slice);
    assert!(unsafe { mem.clean(&mut owner) });
}

#[test]
fn test_attachment() {
    let mem = MemoryUtil::native();
    let mut view = mem.get_hollow_native_byte_buffer();
    assert!(mem.get_attachment(&view).is_none());
    unsafe { mem.set_attachment(&mut view, Some(std::sync::Arc::new(17u32))) };
    let att = mem.get_attachment(&view).unwrap();
    assert_eq!(att.downcast_ref::<u32>(), Some(&17));
    assert!(view.is_derived());
    assert!(!unsafe { mem.clean(&mut view) });
}

#[test]
fn test_chunked_copy_matches_single_pass() {
    let len = 10_000usize;
    let mut rng = fastrand::Rng::with_seed(1234);
    let data = std::iter::repeat_with(|| rng.u8(..))
        .take(len)
        .collect::<Vec<_>>();

    let single = MemoryUtil::new(MemoryConfig::new().with_copy_policy(CopyPolicy::SinglePass));
    let src = Block::new(&single, len);
    unsafe { single.set_bytes(src.address, &data, 0, len) };

    let mut reference = vec![0u8; len];
    let dst = Block::new(&single, len);
    unsafe {
        single.copy_memory(src.address, dst.address, len);
        single
            .get_bytes_checked(dst.address, Some(&mut reference[..]), 0, len as i64)
            .unwrap();
    }
    assert_eq!(reference, data);

    for chunk in [1usize, 7, 1000, 4096, 9999, 10_000, 20_000] {
        let chunked = MemoryUtil::new(MemoryConfig::new().with_copy_policy(CopyPolicy::chunked(chunk)));
        let dst = Block::new(&chunked, len);
        let mut out = vec![0u8; len];
        unsafe {
            chunked.copy_memory(src.address, dst.address, len);
            chunked
                .get_bytes_checked(dst.address, Some(&mut out[..]), 0, len as i64)
                .unwrap();
        }
        assert_eq!(out, reference, "chunk size {chunk}");

        let dst = Block::new(&chunked, len);
        let mut out = vec![0u8; len];
        unsafe {
            chunked.set_bytes_from_array(&data, 0, dst.address, len);
            single
                .get_bytes_checked(dst.address, Some(&mut out[..]), 0, len as i64)
                .unwrap();
        }
        assert_eq!(out, reference, "chunk size {chunk}");
    }
}

#[test]
fn test_set_bytes_from_buffer() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 32);

    let mut heap = HeapBuffer::wrap_range((0..32u8).collect(), 4, 20).unwrap();
    heap.set_position(2).unwrap();
    heap.set_limit(10).unwrap();
    let heap = ByteBuffer::from(heap);
    unsafe { mem.set_bytes_from_buffer(block.address, &heap) };
    let mut out = [0u8; 8];
    unsafe { mem.get_bytes_checked(block.address, Some(&mut out[..]), 0, 8).unwrap() };
    assert_eq!(out, [6, 7, 8, 9, 10, 11, 12, 13]);
    assert_eq!(heap.position(), 2);

    let mut direct = DirectBuffer::allocate_direct(16);
    for i in 0..16 {
        direct.put(i, 100 + i as u8).unwrap();
    }
    direct.set_position(12).unwrap();
    let direct = ByteBuffer::from(direct);
    unsafe { mem.set_bytes_from_buffer(block.address + 16, &direct) };
    let mut out = [0u8; 4];
    unsafe { mem.get_bytes_checked(block.address + 16, Some(&mut out[..]), 0, 4).unwrap() };
    assert_eq!(out, [112, 113, 114, 115]);

    let read_only = ByteBuffer::from(direct.as_direct().unwrap().as_read_only());
    unsafe { mem.set_bytes_from_buffer_at(block.address + 20, &read_only, 1, 2) };
    assert_eq!(unsafe { mem.get_byte(block.address + 20) }, 113);
    assert_eq!(unsafe { mem.get_byte(block.address + 21) }, 114);

    unsafe { mem.set_bytes_from_buffer_at(block.address + 24, &heap, 3, 2) };
    assert_eq!(unsafe { mem.get_byte(block.address + 24) }, 9);
    assert_eq!(unsafe { mem.get_byte(block.address + 25) }, 10);
}

#[test]
fn test_get_bytes_into_buffer() {
    let mem = MemoryUtil::native();
    let block = Block::new(mem, 16);
    let data = (50..66u8).collect::<Vec<_>>();
    unsafe { mem.set_bytes(block.address, &data, 0, 16) };

    let mut heap = HeapBuffer::allocate(12);
    heap.set_position(2).unwrap();
    let mut heap = ByteBuffer::from(heap);
    unsafe {
        mem.get_bytes_into_buffer(block.address, &mut heap, 1, 4).unwrap();
        assert!(
            mem.get_bytes_into_buffer(block.address, &mut heap, 0, 11)
                .unwrap_err()
                .is_out_of_bounds()
        );
        assert!(
            mem.get_bytes_into_buffer(block.address, &mut heap, 0, -1)
                .unwrap_err()
                .is_out_of_bounds()
        );
        mem.get_bytes_into_buffer(block.address, &mut heap, 0, 0).unwrap();
    }
    let heap = heap.as_heap().unwrap();
    assert_eq!(heap.position(), 2);
    assert_eq!(&heap.array()[3..7], &[50, 51, 52, 53]);

    let mut direct = ByteBuffer::from(DirectBuffer::allocate_direct(8));
    unsafe { mem.get_bytes_into_buffer_all(block.address + 8, &mut direct, 8).unwrap() };
    assert_eq!(direct.as_direct().unwrap().get(7).unwrap(), 65);

    let mut positioned = DirectBuffer::allocate_direct(16);
    positioned.set_position(5).unwrap();
    let mut positioned = ByteBuffer::from(positioned);
    unsafe {
        mem.get_bytes_into_buffer(block.address + 4, &mut positioned, 3, 6)
            .unwrap();
        assert!(
            mem.get_bytes_into_buffer(block.address, &mut positioned, 3, 9)
                .unwrap_err()
                .is_out_of_bounds()
        );
        assert!(
            mem.get_bytes_into_buffer(block.address, &mut positioned, -1, 2)
                .unwrap_err()
                .is_out_of_bounds()
        );
    }
    let positioned = positioned.as_direct().unwrap();
    assert_eq!(positioned.position(), 5);
    let mut out = [0u8; 16];
    positioned.get_bytes(0, &mut out).unwrap();
    assert_eq!(&out[..8], &[0; 8]);
    assert_eq!(&out[8..14], &[54, 55, 56, 57, 58, 59]);
    assert_eq!(&out[14..], &[0, 0]);

    let mut read_only = ByteBuffer::from(direct.as_direct().unwrap().as_read_only());
    let err = unsafe { mem.get_bytes_into_buffer_all(block.address, &mut read_only, 4) };
    assert!(matches!(
        err.unwrap_err().kind(),
        ErrorKind::InvalidOperation { .. }
    ));
}

#[test]
fn test_is_exactly_direct() {
    let mem = MemoryUtil::native();
    let direct = ByteBuffer::from(DirectBuffer::allocate_direct(4));
    assert!(mem.is_exactly_direct(&direct));
    let read_only = ByteBuffer::from(direct.as_direct().unwrap().as_read_only());
    assert!(!mem.is_exactly_direct(&read_only));
    assert!(!mem.is_exactly_direct(&ByteBuffer::from(HeapBuffer::allocate(4))));
}

#[test]
fn test_concurrent_disjoint_regions() {
    let mem = *MemoryUtil::native();
    let block = Block::new(&mem, 8 * 1024);
    let base = block.address;
    std::thread::scope(|scope| {
        for t in 0..8u64 {
            scope.spawn(move || {
                let start = base + t * 1024;
                for i in 0..128u64 {
                    unsafe { mem.set_long(start + i * 8, (t * 1000 + i) as i64) };
                }
                for i in 0..128u64 {
                    assert_eq!(unsafe { mem.get_long(start + i * 8) }, (t * 1000 + i) as i64);
                }
            });
        }
    });
}

#[test]
fn test_page_size() {
    let page_size = MemoryUtil::native().page_size();
    assert!(page_size >= 1024);
    assert!(page_size.is_power_of_two());
}

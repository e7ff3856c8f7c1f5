#![cfg(feature = "test_util")]

use keystream::{
    Attr, Attributes, Direction, Error,
    hash::{self, MessageDigest, Sha160},
    hex,
    mode::{self, Mode},
    prng::{self, Prng, PrngId, RandomSource},
    test_hash, test_mode,
};
use num_bigint::BigUint;

test_hash!(sha160, Sha160);
test_hash!(md4, keystream::hash::Md4);
test_mode!(ofb_rijndael, "ofb", "rijndael");
test_mode!(icm_rijndael, "icm", "rijndael");

fn unhex(s: &str) -> Vec<u8> {
    hex::from_hex(s).expect("valid hex")
}

#[test]
fn test_hash_known_answers() {
    let cases = [
        ("md4", "", "31D6CFE0D16AE931B73C59D7E0C089C0"),
        ("md4", "abc", "A448017AAF21D8525FC10AE87AA6729D"),
        ("md5", "", "D41D8CD98F00B204E9800998ECF8427E"),
        ("md5", "abc", "900150983CD24FB0D6963F7D28E17F72"),
        ("sha-160", "", "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"),
        ("sha1", "abc", "A9993E364706816ABA3E25717850C26C9CD0D89D"),
        ("ripemd-160", "", "9C1185A5C5E9FC54612808977EE8F548B2258D31"),
        ("ripemd160", "abc", "8EB208F7E05D987A9B044A8E98C6B087F15A0BFC"),
    ];
    for (name, msg, want) in cases {
        let mut h = hash::get_instance(name).expect("built in");
        h.update(msg.as_bytes());
        assert_eq!(hex::to_hex(&h.digest()), want, "{name}({msg:?})");
    }
}

#[test]
fn test_sha160_million_a() {
    let mut h = hash::get_instance("sha").expect("built in");
    let chunk = [b'a'; 1000];
    for _ in 0..1000 {
        h.update(&chunk);
    }
    assert_eq!(
        hex::to_hex(&h.digest()),
        "34AA973CD4C4DAA4F61EEB2BDBAD27316534016F"
    );
}

fn ofb(key: &[u8], direction: Direction) -> Mode {
    let mut m = mode::get_instance("ofb", "aes", 16)
        .expect("valid block size")
        .expect("built in");
    m.init(
        &Attributes::new()
            .with(Attr::KeyMaterial, key)
            .with(Attr::Iv, unhex("000102030405060708090A0B0C0D0E0F"))
            .with(Attr::State, direction),
    )
    .expect("should init");
    m
}

const SP800_38A_PLAINTEXT: [&str; 4] = [
    "6BC1BEE22E409F96E93D7E117393172A",
    "AE2D8A571E03AC9C9EB76FAC45AF8E51",
    "30C81C46A35CE411E5FBC1191A0A52EF",
    "F69F2445DF4F9B17AD2B417BE66C3710",
];

/// NIST SP 800-38A, F.4.1 through F.4.4.
#[test]
fn test_ofb_sp800_38a() {
    let cases = [
        (
            "2B7E151628AED2A6ABF7158809CF4F3C",
            [
                "3B3FD92EB72DAD20333449F8E83CFB4A",
                "7789508D16918F03F53C52DAC54ED825",
                "9740051E9C5FECF64344F7A82260EDCC",
                "304C6528F659C77866A510D9C1D6AE5E",
            ],
        ),
        (
            "8E73B0F7DA0E6452C810F32B809079E562F8EAD2522C6B7B",
            [
                "CDC80D6FDDF18CAB34C25909C99A4174",
                "FCC28B8D4C63837C09E81700C1100401",
                "8D9A9AEAC0F6596F559C6D4DAF59A5F2",
                "6D9F200857CA6C3E9CAC524BD9ACC92A",
            ],
        ),
    ];
    for (key, ciphertext) in cases {
        let key = unhex(key);
        let mut enc = ofb(&key, Direction::Encrypt);
        let mut dec = ofb(&key, Direction::Decrypt);
        for (pt, ct) in SP800_38A_PLAINTEXT.iter().zip(ciphertext) {
            let mut out = [0u8; 16];
            enc.update(&unhex(pt), &mut out).expect("should encrypt");
            assert_eq!(hex::to_hex(&out), ct);

            dec.update(&unhex(ct), &mut out).expect("should decrypt");
            assert_eq!(hex::to_hex(&out), *pt);
        }
    }
}

#[test_log::test]
fn test_ofb_encrypt_equals_decrypt() {
    let key = [0x5Au8; 32];
    let mut enc = ofb(&key, Direction::Encrypt);
    let mut dec = ofb(&key, Direction::Decrypt);
    let mut rng = Prng::seeded(b"ofb");
    for _ in 0..32 {
        let mut block = [0u8; 16];
        rng.next_bytes(&mut block).expect("no limit");
        let (mut a, mut b) = ([0u8; 16], [0u8; 16]);
        enc.update(&block, &mut a).expect("should encrypt");
        dec.update(&block, &mut b).expect("should decrypt");
        assert_eq!(a, b);
    }
}

fn icm_prng(attrs: &Attributes) -> Prng {
    let mut p = prng::get_instance("icm").expect("built in");
    assert!(!p.is_initialized());
    p.init(attrs).expect("should init");
    p
}

fn next_block(p: &mut Prng) -> String {
    let mut b = [0u8; 16];
    p.next_bytes(&mut b).expect("within limit");
    hex::to_hex(&b)
}

#[test]
fn test_icm_generator_vector_1() {
    let counting = (0u8..16).collect::<Vec<_>>();
    let mut p = icm_prng(
        &Attributes::new()
            .with(Attr::Cipher, "rijndael")
            .with(Attr::KeyMaterial, counting.clone())
            .with(Attr::Offset, counting)
            .with(Attr::SegmentIndexLength, 4usize)
            .with(Attr::BlockIndexLength, 4usize)
            .with(Attr::SegmentIndex, 0usize),
    );
    for want in [
        "0A940BB5416EF045F1C39458C653EA5A",
        "0263EC94661872969ADAFD0F4BA40FDC",
        "1A2D94B3111CA5F8BDC2C84DCC29EC47",
        "4D0BABD2995F9F076223246847B5D30E",
        "8D33F128463B88EFD3F8A52505020379",
    ] {
        assert_eq!(next_block(&mut p), want);
    }
}

#[test]
fn test_icm_generator_vector_2() {
    let offset = BigUint::parse_bytes(b"96C9781981053CBBCB36927844F1932C", 16).expect("valid hex");
    let mut p = icm_prng(
        &Attributes::new()
            .with(Attr::KeyMaterial, unhex("75387824D1F1F3815641B65D78D51EDB"))
            .with(Attr::Offset, offset)
            .with(Attr::SegmentIndex, 0x1234_5678usize)
            .with(Attr::BlockIndexLength, 2usize),
    );
    for want in [
        "EA0AA027BA6D56E44B28F43A7E3E5F58",
        "CBDB3107EDA8D420D3EF7AB7FF290166",
        "AED6F7CB14ED49174336CC010AEB8780",
    ] {
        assert_eq!(next_block(&mut p), want);
    }
}

#[test_log::test]
fn test_icm_capacity_boundary() {
    let attrs = Attributes::new()
        .with(Attr::KeyMaterial, [7u8; 16])
        .with(Attr::Offset, [0u8; 16])
        .with(Attr::BlockIndexLength, 1usize);
    let mut p = icm_prng(&attrs);

    let mut blocks = Vec::new();
    for _ in 0..256 {
        blocks.push(next_block(&mut p));
    }
    let mut b = [0u8; 16];
    assert_eq!(p.next_bytes(&mut b), Err(Error::LimitReached));
    assert_eq!(p.next_byte(), Err(Error::LimitReached));

    // The same configuration replays the same keystream.
    let mut q = icm_prng(&attrs);
    assert_eq!(next_block(&mut q), blocks[0]);

    // Every block in the segment is distinct.
    blocks.sort_unstable();
    blocks.dedup();
    assert_eq!(blocks.len(), 256);
}

#[test]
fn test_icm_partial_reads_cross_blocks() {
    let attrs = Attributes::new()
        .with(Attr::KeyMaterial, [3u8; 16])
        .with(Attr::Offset, 42usize)
        .with(Attr::BlockIndexLength, 1usize);
    let mut whole = icm_prng(&attrs);
    let mut want = vec![0u8; 16 * 256];
    whole.next_bytes(&mut want).expect("exactly at the limit");

    let mut pieces = icm_prng(&attrs);
    let mut got = Vec::new();
    let mut n = 1;
    while got.len() < want.len() {
        let mut buf = vec![0u8; n.min(want.len() - got.len())];
        pieces.next_bytes(&mut buf).expect("within limit");
        got.extend_from_slice(&buf);
        n += 5;
    }
    assert_eq!(got, want);
}

#[test]
fn test_umac_clone_structure_requires_init() {
    let attrs = Attributes::new()
        .with(Attr::KeyMaterial, [0u8; 16])
        .with(Attr::Index, 0usize);
    let mut p = prng::get_instance("umac-kdf").expect("built in");
    p.init(&attrs).expect("should init");
    assert_eq!(p.id(), PrngId::UMac);

    let mut first = [0u8; 16];
    p.next_bytes(&mut first).expect("no limit");
    assert_eq!(hex::to_hex(&first), "66E94BD4EF8A2C3B884CFA59CA342B2E");

    let mut c = p.clone_structure();
    assert!(!c.is_initialized());
    let err = c.next_byte().expect_err("not initialized");
    assert!(err.is_state(), "{err}");

    c.init(&attrs).expect("should init");
    let mut again = [0u8; 16];
    c.next_bytes(&mut again).expect("no limit");
    assert_eq!(again, first);
}

#[test]
fn test_prng_as_random_source() {
    fn draw(rng: &mut dyn RandomSource) -> Vec<u8> {
        let mut out = vec![0u8; 40];
        rng.next_bytes(&mut out).expect("no limit");
        out
    }
    let a = draw(&mut Prng::reproducible());
    let b = draw(&mut Prng::reproducible());
    assert_eq!(a, b);
    assert_ne!(a, draw(&mut Prng::seeded(b"other")));
}

#[test]
fn test_factories_reject_unknown_names() {
    assert!(hash::get_instance("sha-256").is_none());
    assert!(prng::get_instance("fortuna").is_none());
    assert!(matches!(mode::get_instance("cbc", "aes", 16), Ok(None)));
    assert!(matches!(mode::get_instance("ofb", "twofish", 16), Ok(None)));
    let err = mode::get_instance("ofb", "aes", 24).expect_err("AES has 16 byte blocks");
    assert_eq!(err, Error::Config(Attr::CipherBlockSize.name()));
}

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cryptocore::{
    BlockCipher, CbcContext, Des, OsEntropy, RngConfig, RngHandle, TripleDes, process_rng,
};

const SIZES: [usize; 2] = [1024, 64 * 1024];

fn bench_cbc(c: &mut Criterion) {
    let mut group = c.benchmark_group("cbc");

    for size in SIZES {
        let plaintext = vec![0x42u8; size];
        let mut ciphertext = vec![0u8; size];
        let blocks = size / 8;
        group.throughput(Throughput::Bytes(size as u64));

        let mut des = CbcContext::<Des>::init(&[0x13u8; 8]).unwrap();
        group.bench_with_input(BenchmarkId::new("des_encrypt", size), &plaintext, |b, pt| {
            b.iter(|| {
                let mut iv = [0u8; 8];
                des.encrypt(&mut iv, blocks, black_box(pt), &mut ciphertext).unwrap();
            });
        });

        let mut tdes = CbcContext::<TripleDes>::init(&[0x37u8; 24]).unwrap();
        group.bench_with_input(BenchmarkId::new("3des_encrypt", size), &plaintext, |b, pt| {
            b.iter(|| {
                let mut iv = [0u8; 8];
                tdes.encrypt(&mut iv, blocks, black_box(pt), &mut ciphertext).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_key_schedule(c: &mut Criterion) {
    c.bench_function("3des_key_schedule", |b| {
        b.iter(|| black_box(TripleDes::with_key(black_box(&[0x5au8; 24])).unwrap()));
    });
}

fn bench_rng(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng");
    let rng = process_rng().unwrap();

    for size in [32usize, 4096] {
        let mut out = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::new("process_generate", size), |b| {
            b.iter(|| rng.generate(black_box(&mut out)).unwrap());
        });
    }

    let small_requests =
        RngHandle::open(OsEntropy::new(), RngConfig::new(1 << 20, 64)).unwrap();
    let mut out = vec![0u8; 4096];
    group.bench_function("generate_4096_in_64b_requests", |b| {
        b.iter(|| small_requests.generate(black_box(&mut out)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_cbc, bench_key_schedule, bench_rng);
criterion_main!(benches);

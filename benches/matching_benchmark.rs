use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use sigma_evaluator::{
    for_detection, Context, Detection, Event, FieldMatcher, RuleEvaluator, Search, SearchExpr,
    StaticPlaceholders,
};

fn criterion_benchmark(c: &mut Criterion) {
    let detection = Detection::new()
        .with_search(
            "selection_filename_suffix",
            Search::from_fields([
                FieldMatcher::new("TargetFilename", ["contains"], [":\\temp\\"]),
                FieldMatcher::new("TargetFilename", ["endswith"], [".exe"]),
            ]),
        )
        .with_search(
            "selection_image_suffix",
            Search::from_fields([FieldMatcher::new("Image", ["contains"], [":\\temp\\"])]),
        )
        .with_search(
            "selection_user",
            Search::from_fields([FieldMatcher::equals("UserData.TargetUserName", ["%users%"])]),
        )
        .with_condition(SearchExpr::AllOfThem.into());

    let evaluator: RuleEvaluator = for_detection(&detection)
        .with_placeholder_expander(StaticPlaceholders::from([(
            "%users%",
            vec!["johndoe", "janedoe"],
        )]))
        .build()
        .unwrap();

    let event: Event = json!( {
        "EventID": 4624,
        "LogName": "Security",
        "TimeCreated": "2023-10-01T12:34:56.789Z",
        "EventRecordID": 123456,
        "Channel": "Security",
        "Computer": "DESKTOP-1234ABCD",
        "UserData": {
            "SubjectUserName": "johndoe",
            "SubjectDomainName": "WORKGROUP",
            "SubjectLogonId": "0x123456",
            "TargetUserName": "johndoe",
            "TargetDomainName": "WORKGROUP",
            "TargetLogonId": "0x654321",
            "LogonType": 2,
            "LogonProcessName": "User32",
            "AuthenticationPackageName": "Negotiate",
            "WorkstationName": "DESKTOP-1234ABCD",
            "ProcessId": 1234,
            "ProcessName": "C:\\Windows\\System32\\winlogon.exe",
            "IpAddress": "192.168.1.100",
            "IpPort": "12345"
        },
        "TargetFilename": "C:\\temp\\autoit3.exe",
        "Image": "C:\\temp\\hello.au3"
    })
    .try_into()
    .unwrap();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let ctx = Context::new();

    c.bench_function("detection_match", |b| {
        b.iter(|| {
            runtime
                .block_on(evaluator.matches(black_box(&ctx), black_box(&event)))
                .unwrap()
        })
    });

    c.bench_function("detection_compile", |b| {
        b.iter(|| RuleEvaluator::new(black_box(&detection)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
